//! stanza-editor: A portable-text editing core.
//!
//! This crate provides:
//! - `Editor` - the composed editing pipeline over an `EditingSurface`
//! - `Operation` - the closed set of primitive editing operations
//! - `translate` - operation-to-patch translation against the pre-op value
//! - `BehaviorPlugin` and the built-in plugin chain (keys, schema, marks,
//!   styles, lists, placeholder, break insertion, block ceiling, history,
//!   patch publication, selections)
//! - `PatchHub` / `ChangeHub` - synchronous patch and change streams
//! - `History` - bounded, invertible undo/redo stacks
//!
//! The editor never mutates the document directly: every edit is an
//! operation that plugins may rewrite or veto, the translator turns into
//! key-addressed patches, and the surface applies mechanically. The patch
//! stream is the single source of truth for persistence.

pub mod composer;
pub mod editor;
pub mod error;
pub mod history;
pub mod operation;
pub mod plugin;
pub mod plugins;
pub mod stream;
pub mod surface;
pub mod translate;

pub use composer::EditorOptions;
pub use editor::{Editor, SubscriptionSet};
pub use error::EditorError;
pub use history::{DEFAULT_UNDO_DEPTH, History, HistoryEntry};
pub use operation::{Node, NodePosition, Operation, TextPoint};
pub use plugin::{ApplyDecision, BehaviorPlugin, CommitRecord, EditorState, PassKind, PluginCtx};
pub use stream::{BlockedReason, ChangeEvent, ChangeHub, ListenerId, PatchHub};
pub use surface::{EditingSurface, MemorySurface};
pub use translate::translate;
