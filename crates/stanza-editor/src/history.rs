//! Undo/redo history stacks.
//!
//! Each entry is an invertible batch of patches plus the selections around
//! it. Entries are pushed on committed local changes, popped by undo/redo,
//! and cleared on destroy.

use stanza_patch::Patch;
use stanza_types::Selection;

/// Default maximum number of undo steps kept.
pub const DEFAULT_UNDO_DEPTH: usize = 100;

/// A named, invertible batch of patches with selection snapshots.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    /// The patches as originally committed.
    pub patches: Vec<Patch>,
    /// Patches that undo them, in application order.
    pub inverse: Vec<Patch>,
    pub selection_before: Option<Selection>,
    pub selection_after: Option<Selection>,
}

/// Undo and redo stacks with bounded depth.
#[derive(Debug)]
pub struct History {
    undos: Vec<HistoryEntry>,
    redos: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undos: Vec::new(),
            redos: Vec::new(),
            max_depth,
        }
    }

    /// Record a committed change. Clears the redo stack and evicts the
    /// oldest entry when over depth.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.redos.clear();
        self.undos.push(entry);
        while self.undos.len() > self.max_depth {
            self.undos.remove(0);
        }
    }

    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undos.pop()
    }

    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redos.pop()
    }

    /// Move an undone entry onto the redo stack.
    pub fn stash_redo(&mut self, entry: HistoryEntry) {
        self.redos.push(entry);
    }

    /// Move a redone entry back onto the undo stack (without clearing redos).
    pub fn restore_undo(&mut self, entry: HistoryEntry) {
        self.undos.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> HistoryEntry {
        HistoryEntry {
            patches: Vec::new(),
            inverse: Vec::new(),
            selection_before: None,
            selection_after: None,
        }
    }

    #[test]
    fn test_push_clears_redo() {
        let mut h = History::new(10);
        h.push(entry());
        let e = h.pop_undo().unwrap();
        h.stash_redo(e);
        assert!(h.can_redo());
        h.push(entry());
        assert!(!h.can_redo());
    }

    #[test]
    fn test_depth_eviction() {
        let mut h = History::new(2);
        h.push(entry());
        h.push(entry());
        h.push(entry());
        assert!(h.pop_undo().is_some());
        assert!(h.pop_undo().is_some());
        assert!(h.pop_undo().is_none());
    }

    #[test]
    fn test_clear() {
        let mut h = History::new(10);
        h.push(entry());
        let e = h.pop_undo().unwrap();
        h.stash_redo(e);
        h.push(entry());
        h.clear();
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
