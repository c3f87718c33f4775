//! Plugin chain composition.
//!
//! The chain is an ordered list, applied first-to-last for interception and
//! normalization. Ordering matters: operation rewriters (insert-break) run
//! before the key plugin so rewritten operations receive keys, keys are
//! assigned before the model plugins that depend on addressable nodes, and
//! the commit-side plugins (history, publication, selection events) come
//! last. Read-only editors omit the mutation-side plugins entirely.

use stanza_types::{KeyGenerator, SchemaTypes, UuidKeyGenerator};

use crate::history::DEFAULT_UNDO_DEPTH;
use crate::plugin::BehaviorPlugin;
use crate::plugins::{
    BlockStylePlugin, InsertBreakPlugin, ListsPlugin, MarkModelPlugin, MaxBlocksPlugin,
    ObjectKeysPlugin, PatchesPlugin, PlaceholderPlugin, SchemaTypesPlugin, SelectionsPlugin,
    UndoRedoPlugin,
};
use crate::surface::EditingSurface;

/// Configuration for a composed editor.
pub struct EditorOptions {
    pub schema: SchemaTypes,
    pub key_generator: Box<dyn KeyGenerator>,
    pub read_only: bool,
    /// Maximum number of top-level blocks; `None` means unlimited.
    pub max_blocks: Option<usize>,
    /// Maximum number of undo steps kept.
    pub undo_depth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            schema: SchemaTypes::default(),
            key_generator: Box::new(UuidKeyGenerator),
            read_only: false,
            max_blocks: None,
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

impl std::fmt::Debug for EditorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorOptions")
            .field("read_only", &self.read_only)
            .field("max_blocks", &self.max_blocks)
            .field("undo_depth", &self.undo_depth)
            .finish_non_exhaustive()
    }
}

/// Build the plugin chain for the given mode.
pub(crate) fn compose<S: EditingSurface>(read_only: bool) -> Vec<Box<dyn BehaviorPlugin<S>>> {
    let mut chain: Vec<Box<dyn BehaviorPlugin<S>>> = vec![
        Box::new(SchemaTypesPlugin),
        Box::new(InsertBreakPlugin),
        Box::new(ObjectKeysPlugin),
        Box::new(MarkModelPlugin),
        Box::new(BlockStylePlugin),
        Box::new(ListsPlugin),
        Box::new(PlaceholderPlugin),
    ];
    if !read_only {
        chain.push(Box::new(MaxBlocksPlugin));
        chain.push(Box::new(UndoRedoPlugin));
        chain.push(Box::new(PatchesPlugin::default()));
    }
    chain.push(Box::new(SelectionsPlugin));
    chain
}
