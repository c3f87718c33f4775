//! Primitive editing operations.
//!
//! Operations are the atomic edit requests intercepted by the plugin chain.
//! They are transient: consumed immediately by one processing pass, never
//! persisted. Unlike patches, operations address nodes by surface position
//! (numeric indices); the translator resolves positions to key paths.

use serde_json::Map;
use serde_json::Value;
use smol_str::SmolStr;
use stanza_types::{Block, Child, KeyGenerator, Selection};

/// A character position inside a span: block index, child index, offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPoint {
    pub block: usize,
    pub child: usize,
    pub offset: usize,
}

impl TextPoint {
    pub fn new(block: usize, child: usize, offset: usize) -> Self {
        Self {
            block,
            child,
            offset,
        }
    }
}

/// A node position: a block index, optionally descending to a child index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodePosition {
    pub block: usize,
    pub child: Option<usize>,
}

impl NodePosition {
    pub fn block(block: usize) -> Self {
        Self { block, child: None }
    }

    pub fn child(block: usize, child: usize) -> Self {
        Self {
            block,
            child: Some(child),
        }
    }
}

/// A node being inserted: either a top-level block or a text-block child.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Node {
    Block(Block),
    Child(Child),
}

impl Node {
    pub fn key(&self) -> &SmolStr {
        match self {
            Node::Block(b) => b.key(),
            Node::Child(c) => c.key(),
        }
    }

    pub fn type_name(&self) -> &SmolStr {
        match self {
            Node::Block(b) => b.type_name(),
            Node::Child(c) => c.type_name(),
        }
    }

    /// Assign fresh keys to this node and any nested children missing one.
    pub fn assign_missing_keys(&mut self, keys: &dyn KeyGenerator) {
        match self {
            Node::Block(block) => {
                if block.key().is_empty() {
                    block.set_key(keys.next_key());
                }
                if let Some(text) = block.as_text_mut() {
                    for child in &mut text.children {
                        if child.key().is_empty() {
                            child.set_key(keys.next_key());
                        }
                    }
                }
            }
            Node::Child(child) => {
                if child.key().is_empty() {
                    child.set_key(keys.next_key());
                }
            }
        }
    }
}

/// The closed set of primitive editing operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Insert text into a span at a character offset.
    InsertText { at: TextPoint, text: String },
    /// Remove `len` characters from a span starting at a character offset.
    RemoveText { at: TextPoint, len: usize },
    /// Insert a block or child node at a position.
    InsertNode { at: NodePosition, node: Node },
    /// Remove the node at a position.
    RemoveNode { at: NodePosition },
    /// Split a text block at a character point. The right half becomes a new
    /// sibling block. Keys for the new block and its leading span are filled
    /// in by the object-keys plugin before translation.
    SplitNode {
        at: TextPoint,
        new_block_key: Option<SmolStr>,
        new_child_key: Option<SmolStr>,
    },
    /// Merge the node at a position into its previous sibling.
    MergeNode { at: NodePosition },
    /// Move a block to a new index.
    MoveNode { from: NodePosition, to: NodePosition },
    /// Set properties on the node at a position. `null` values clear the
    /// property.
    SetNode {
        at: NodePosition,
        props: Map<String, Value>,
    },
    /// Replace the selection.
    SetSelection { selection: Option<Selection> },
}

impl Operation {
    /// Whether this operation leaves the document value untouched.
    pub fn is_selection_only(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    /// Whether this operation adds a top-level block.
    pub fn grows_block_count(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode {
                at: NodePosition { child: None, .. },
                ..
            } | Operation::SplitNode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_types::{SequentialKeyGenerator, Span, TextBlock};

    #[test]
    fn test_selection_only() {
        let op = Operation::SetSelection { selection: None };
        assert!(op.is_selection_only());
        let op = Operation::RemoveNode {
            at: NodePosition::block(0),
        };
        assert!(!op.is_selection_only());
    }

    #[test]
    fn test_grows_block_count() {
        let block = Node::Block(Block::Text(TextBlock::default()));
        assert!(
            Operation::InsertNode {
                at: NodePosition::block(0),
                node: block.clone()
            }
            .grows_block_count()
        );
        assert!(
            !Operation::InsertNode {
                at: NodePosition::child(0, 0),
                node: block
            }
            .grows_block_count()
        );
    }

    #[test]
    fn test_assign_missing_keys_is_idempotent() {
        let keys = SequentialKeyGenerator::new();
        let mut node = Node::Block(Block::Text(TextBlock {
            type_name: "block".into(),
            children: vec![Child::Span(Span::new("", "span", "x"))],
            ..TextBlock::default()
        }));
        node.assign_missing_keys(&keys);
        assert_eq!(node.key(), "k0");
        let before = node.clone();
        node.assign_missing_keys(&keys);
        assert_eq!(node, before);
    }
}
