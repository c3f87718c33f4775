//! Patch kinds and batches.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stanza_types::Document;

use crate::diff::TextDelta;
use crate::path::Path;

/// A single path-addressed mutation instruction.
///
/// Patches are immutable once emitted. Within a batch they must be applied
/// in emission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Patch {
    /// Set the value at `path`.
    Set { path: Path, value: Value },
    /// Remove the node or attribute at `path`.
    Unset { path: Path },
    /// Insert items relative to an anchor.
    ///
    /// The anchor is either an item path (insert before/after that item) or
    /// a container path - the root or a `children` attribute - in which case
    /// `Before` prepends and `After` appends.
    Insert {
        path: Path,
        position: InsertPosition,
        items: Vec<Value>,
    },
    /// Apply a structured text diff to the string at `path`.
    DiffMatchPatch { path: Path, deltas: Vec<TextDelta> },
}

impl Patch {
    pub fn path(&self) -> &Path {
        match self {
            Patch::Set { path, .. }
            | Patch::Unset { path }
            | Patch::Insert { path, .. }
            | Patch::DiffMatchPatch { path, .. } => path,
        }
    }
}

/// Placement of inserted items relative to the anchor path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertPosition {
    Before,
    After,
}

/// Origin of a patch batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchOrigin {
    /// Produced by this editor instance.
    Local,
    /// Produced elsewhere and merged by the document store.
    Remote,
}

/// An ordered batch of patches plus the document snapshot after applying
/// them, as published on the patch stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchBatch {
    pub patches: Vec<Patch>,
    pub snapshot: Document,
    pub origin: PatchOrigin,
}
