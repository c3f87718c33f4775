//! stanza-types: The portable-text document model.
//!
//! This crate provides:
//! - `Document`, `Block`, `Child`, `Span` - the block-structured value
//! - `MarkDef` - per-block annotation objects referenced from span marks
//! - `SchemaTypes` - read-only description of allowed types/styles/lists
//! - `KeyGenerator` trait plus the default uuid-backed implementation
//! - `Selection` / `SelectionPoint` - key-addressed selection state
//!
//! All nodes are addressed by stable `_key` strings, never by array index.

pub mod block;
pub mod key;
pub mod schema;
pub mod selection;

pub use block::{Block, Child, Document, InlineObject, MarkDef, ObjectBlock, Span, TextBlock};
pub use key::{KeyGenerator, SequentialKeyGenerator, UuidKeyGenerator};
pub use schema::SchemaTypes;
pub use selection::{Selection, SelectionPoint};
pub use smol_str::SmolStr;
