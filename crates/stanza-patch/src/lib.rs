//! stanza-patch: Path-addressed patches against a portable-text document.
//!
//! This crate provides:
//! - `Path` / `PathSegment` - key-addressed paths into a `Document`
//! - `Patch` - set / unset / insert / diffMatchPatch mutation instructions
//! - `apply` / `apply_all` - patch application
//! - `invert` / `invert_batch` - patch inversion for undo
//! - `TextDelta` and text diffing helpers
//!
//! Patches address nodes by `_key`, never by numeric index, so they stay
//! valid when concurrent edits reorder siblings.

pub mod apply;
pub mod diff;
pub mod error;
pub mod invert;
pub mod patch;
pub mod path;

pub use apply::{apply, apply_all, resolve};
pub use diff::{TextDelta, apply_deltas, diff_text, invert_deltas};
pub use error::PatchError;
pub use invert::{invert, invert_batch};
pub use patch::{InsertPosition, Patch, PatchBatch, PatchOrigin};
pub use path::{Path, PathSegment};
