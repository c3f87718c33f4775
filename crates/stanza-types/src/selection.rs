//! Key-addressed selection state.
//!
//! A selection is an anchor/focus pair of points; each point names a block,
//! a child within it, and a character offset into that child's text.
//! Selections are derived state and are re-validated after every
//! document-affecting operation.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::block::Document;

/// One end of a selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPoint {
    /// `_key` of the block.
    pub block_key: SmolStr,
    /// `_key` of the child within the block.
    pub child_key: SmolStr,
    /// Character offset into the child's text (0 for inline objects).
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(block_key: impl Into<SmolStr>, child_key: impl Into<SmolStr>, offset: usize) -> Self {
        Self {
            block_key: block_key.into(),
            child_key: child_key.into(),
            offset,
        }
    }

    /// Whether the point still addresses an existing node with a valid offset.
    pub fn is_valid(&self, doc: &Document) -> bool {
        let Some(block) = doc.block_by_key(&self.block_key) else {
            return false;
        };
        let Some(text) = block.as_text() else {
            // Object blocks are addressed with an empty child key.
            return self.child_key.is_empty() && self.offset == 0;
        };
        match text.child_by_key(&self.child_key) {
            Some(child) => match child.as_span() {
                Some(span) => self.offset <= span.len_chars(),
                None => self.offset == 0,
            },
            None => false,
        }
    }
}

/// Anchor/focus selection. Collapsed when both points are equal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl Selection {
    pub fn new(anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        Self { anchor, focus }
    }

    /// A caret selection at a single point.
    pub fn collapsed(point: SelectionPoint) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Whether the focus point comes before the anchor in document order.
    pub fn is_backward(&self, doc: &Document) -> bool {
        let pos = |p: &SelectionPoint| -> Option<(usize, usize, usize)> {
            let bi = doc.index_of(&p.block_key)?;
            let ci = doc.blocks[bi]
                .as_text()
                .and_then(|b| b.index_of_child(&p.child_key))
                .unwrap_or(0);
            Some((bi, ci, p.offset))
        };
        match (pos(&self.focus), pos(&self.anchor)) {
            (Some(f), Some(a)) => f < a,
            _ => false,
        }
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.anchor.is_valid(doc) && self.focus.is_valid(doc)
    }
}
