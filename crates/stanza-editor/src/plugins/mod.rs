//! Behavior plugins.
//!
//! Each module enforces one concern. The composer folds them into the
//! chain in a fixed order; see `composer` for the ordering contract.

pub mod block_style;
pub mod insert_break;
pub mod lists;
pub mod mark_model;
pub mod max_blocks;
pub mod object_keys;
pub mod patches;
pub mod placeholder;
pub mod schema_types;
pub mod selections;
pub mod undo_redo;
pub mod utils;

pub use block_style::BlockStylePlugin;
pub use insert_break::InsertBreakPlugin;
pub use lists::ListsPlugin;
pub use mark_model::MarkModelPlugin;
pub use max_blocks::MaxBlocksPlugin;
pub use object_keys::ObjectKeysPlugin;
pub use patches::PatchesPlugin;
pub use placeholder::PlaceholderPlugin;
pub use schema_types::SchemaTypesPlugin;
pub use selections::SelectionsPlugin;
pub use undo_redo::UndoRedoPlugin;
