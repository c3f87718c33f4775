//! The editing surface boundary.
//!
//! The real rich-text engine lives outside this crate; the core only needs
//! the narrow `EditingSurface` contract: read the current value/selection
//! and mechanically apply primitive operations. `MemorySurface` is the
//! reference implementation, used by tests and headless hosts.

use serde_json::{Map, Value};
use stanza_types::{Block, Child, Document, Selection, Span, TextBlock};

use crate::error::EditorError;
use crate::operation::{Node, NodePosition, Operation, TextPoint};

/// Contract between the plugin chain and the underlying editing engine.
pub trait EditingSurface {
    /// Current document value. The surface owns the working copy; the core
    /// only reads it and proposes patches against it.
    fn value(&self) -> &Document;

    /// Mutable access to the working copy. Reserved for the composer: undo
    /// and redo restore state by applying inverse patch batches.
    fn value_mut(&mut self) -> &mut Document;

    /// Current selection.
    fn selection(&self) -> Option<&Selection>;

    /// Replace the selection without going through the operation pipeline.
    fn set_selection(&mut self, selection: Option<Selection>);

    /// Mechanically apply one primitive operation to the working copy.
    fn apply(&mut self, op: &Operation) -> Result<(), EditorError>;
}

/// In-memory surface holding a document and selection.
#[derive(Debug, Default)]
pub struct MemorySurface {
    doc: Document,
    selection: Option<Selection>,
}

impl MemorySurface {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            selection: None,
        }
    }
}

impl EditingSurface for MemorySurface {
    fn value(&self) -> &Document {
        &self.doc
    }

    fn value_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    fn apply(&mut self, op: &Operation) -> Result<(), EditorError> {
        match op {
            Operation::InsertText { at, text } => {
                let span = span_at_mut(&mut self.doc, *at)?;
                insert_chars(&mut span.text, at.offset, text)
            }
            Operation::RemoveText { at, len } => {
                let span = span_at_mut(&mut self.doc, *at)?;
                remove_chars(&mut span.text, at.offset, *len)
            }
            Operation::InsertNode { at, node } => insert_node(&mut self.doc, *at, node),
            Operation::RemoveNode { at } => remove_node(&mut self.doc, *at),
            Operation::SplitNode {
                at,
                new_block_key,
                new_child_key,
            } => split_block(
                &mut self.doc,
                *at,
                new_block_key.clone().unwrap_or_default(),
                new_child_key.clone().unwrap_or_default(),
            ),
            Operation::MergeNode { at } => merge_node(&mut self.doc, *at),
            Operation::MoveNode { from, to } => move_block(&mut self.doc, *from, *to),
            Operation::SetNode { at, props } => set_node_props(&mut self.doc, *at, props),
            Operation::SetSelection { selection } => {
                self.selection = selection.clone();
                Ok(())
            }
        }
    }
}

fn out_of_bounds(what: impl Into<String>) -> EditorError {
    EditorError::OutOfBounds(what.into())
}

fn text_block_at_mut(doc: &mut Document, block: usize) -> Result<&mut TextBlock, EditorError> {
    let len = doc.len();
    doc.blocks
        .get_mut(block)
        .ok_or_else(|| out_of_bounds(format!("block {block} of {len}")))?
        .as_text_mut()
        .ok_or_else(|| EditorError::InvalidOperation(format!("block {block} is not a text block")))
}

fn span_at_mut(doc: &mut Document, at: TextPoint) -> Result<&mut Span, EditorError> {
    let text = text_block_at_mut(doc, at.block)?;
    let len = text.children.len();
    text.children
        .get_mut(at.child)
        .ok_or_else(|| out_of_bounds(format!("child {} of {len}", at.child)))?
        .as_span_mut()
        .ok_or_else(|| {
            EditorError::InvalidOperation(format!("child {} is not a span", at.child))
        })
}

fn char_to_byte(s: &str, offset: usize) -> Result<usize, EditorError> {
    if offset == 0 {
        return Ok(0);
    }
    s.char_indices()
        .nth(offset - 1)
        .map(|(i, c)| i + c.len_utf8())
        .ok_or_else(|| out_of_bounds(format!("offset {offset} in text of {} chars", s.chars().count())))
}

fn insert_chars(text: &mut String, offset: usize, insert: &str) -> Result<(), EditorError> {
    let at = char_to_byte(text, offset)?;
    text.insert_str(at, insert);
    Ok(())
}

fn remove_chars(text: &mut String, offset: usize, len: usize) -> Result<(), EditorError> {
    let start = char_to_byte(text, offset)?;
    let end = char_to_byte(text, offset + len)?;
    text.replace_range(start..end, "");
    Ok(())
}

fn insert_node(doc: &mut Document, at: NodePosition, node: &Node) -> Result<(), EditorError> {
    match (at.child, node) {
        (None, Node::Block(block)) => {
            if at.block > doc.len() {
                return Err(out_of_bounds(format!("block {} of {}", at.block, doc.len())));
            }
            doc.blocks.insert(at.block, block.clone());
            Ok(())
        }
        (Some(child), Node::Child(c)) => {
            let text = text_block_at_mut(doc, at.block)?;
            if child > text.children.len() {
                return Err(out_of_bounds(format!(
                    "child {child} of {}",
                    text.children.len()
                )));
            }
            text.children.insert(child, c.clone());
            Ok(())
        }
        _ => Err(EditorError::InvalidOperation(
            "node shape does not match insert position".into(),
        )),
    }
}

fn remove_node(doc: &mut Document, at: NodePosition) -> Result<(), EditorError> {
    match at.child {
        None => {
            if at.block >= doc.len() {
                return Err(out_of_bounds(format!("block {} of {}", at.block, doc.len())));
            }
            doc.blocks.remove(at.block);
            Ok(())
        }
        Some(child) => {
            let text = text_block_at_mut(doc, at.block)?;
            if child >= text.children.len() {
                return Err(out_of_bounds(format!(
                    "child {child} of {}",
                    text.children.len()
                )));
            }
            text.children.remove(child);
            Ok(())
        }
    }
}

fn split_block(
    doc: &mut Document,
    at: TextPoint,
    new_block_key: stanza_types::SmolStr,
    new_child_key: stanza_types::SmolStr,
) -> Result<(), EditorError> {
    let text = text_block_at_mut(doc, at.block)?;
    let (span_type, marks, right) = {
        let span = text
            .children
            .get_mut(at.child)
            .and_then(|c| c.as_span_mut())
            .ok_or_else(|| EditorError::InvalidOperation("split point is not in a span".into()))?;
        let at_byte = char_to_byte(&span.text, at.offset)?;
        let right = span.text.split_off(at_byte);
        (span.type_name.clone(), span.marks.clone(), right)
    };

    // Children after the split child move to the new block; the split child
    // itself keeps its key and the left half of its text.
    let moved: Vec<Child> = text.children.split_off(at.child + 1);
    let mut right_span = Span::new(new_child_key, span_type, right);
    right_span.marks = marks;

    let new_block = TextBlock {
        key: new_block_key,
        type_name: text.type_name.clone(),
        style: text.style.clone(),
        list_item: text.list_item.clone(),
        level: text.level,
        children: std::iter::once(Child::Span(right_span)).chain(moved).collect(),
        mark_defs: text.mark_defs.clone(),
    };
    doc.blocks.insert(at.block + 1, Block::Text(new_block));
    Ok(())
}

fn merge_node(doc: &mut Document, at: NodePosition) -> Result<(), EditorError> {
    match at.child {
        None => {
            if at.block == 0 || at.block >= doc.len() {
                return Err(out_of_bounds(format!("merge block {} of {}", at.block, doc.len())));
            }
            let removed = doc.blocks.remove(at.block);
            let removed = removed.as_text().cloned().ok_or_else(|| {
                EditorError::InvalidOperation("cannot merge a non-text block".into())
            })?;
            let prev = text_block_at_mut(doc, at.block - 1)?;
            for def in removed.mark_defs {
                if prev.mark_def(&def.key).is_none() {
                    prev.mark_defs.push(def);
                }
            }
            prev.children.extend(removed.children);
            Ok(())
        }
        Some(child) => {
            let text = text_block_at_mut(doc, at.block)?;
            if child == 0 || child >= text.children.len() {
                return Err(out_of_bounds(format!(
                    "merge child {child} of {}",
                    text.children.len()
                )));
            }
            let removed = text.children.remove(child);
            let (Some(removed), Some(prev)) =
                (removed.as_span(), text.children[child - 1].as_span_mut())
            else {
                return Err(EditorError::InvalidOperation(
                    "can only merge adjacent spans".into(),
                ));
            };
            prev.text.push_str(&removed.text);
            Ok(())
        }
    }
}

fn move_block(doc: &mut Document, from: NodePosition, to: NodePosition) -> Result<(), EditorError> {
    if from.child.is_some() || to.child.is_some() {
        return Err(EditorError::InvalidOperation(
            "move is only supported for blocks".into(),
        ));
    }
    if from.block >= doc.len() {
        return Err(out_of_bounds(format!("block {} of {}", from.block, doc.len())));
    }
    let block = doc.blocks.remove(from.block);
    let dest = to.block.min(doc.len());
    doc.blocks.insert(dest, block);
    Ok(())
}

fn set_node_props(
    doc: &mut Document,
    at: NodePosition,
    props: &Map<String, Value>,
) -> Result<(), EditorError> {
    match at.child {
        None => {
            if at.block >= doc.len() {
                return Err(out_of_bounds(format!("block {} of {}", at.block, doc.len())));
            }
            let merged = merge_into_value(&doc.blocks[at.block], props)?;
            doc.blocks[at.block] = serde_json::from_value::<Block>(merged)
                .map_err(stanza_patch::PatchError::from)?;
            Ok(())
        }
        Some(child) => {
            let text = text_block_at_mut(doc, at.block)?;
            if child >= text.children.len() {
                return Err(out_of_bounds(format!(
                    "child {child} of {}",
                    text.children.len()
                )));
            }
            let merged = merge_into_value(&text.children[child], props)?;
            text.children[child] = serde_json::from_value::<Child>(merged)
                .map_err(stanza_patch::PatchError::from)?;
            Ok(())
        }
    }
}

fn merge_into_value<T: serde::Serialize>(
    node: &T,
    props: &Map<String, Value>,
) -> Result<Value, EditorError> {
    let mut value = serde_json::to_value(node).map_err(stanza_patch::PatchError::from)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| EditorError::InvalidOperation("node is not an object".into()))?;
    for (prop, v) in props {
        if v.is_null() {
            obj.remove(prop);
        } else {
            obj.insert(prop.clone(), v.clone());
        }
    }
    Ok(value)
}
