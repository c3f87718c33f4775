//! Error types for the editing core.

use smol_str::SmolStr;
use stanza_patch::PatchError;
use thiserror::Error;

/// Errors raised by the editor pipeline.
///
/// Structural violations never surface here - normalization repairs them
/// silently. These errors cover lifecycle misuse and operations addressing
/// nodes that do not exist.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EditorError {
    /// `destroy()` called without a completed install, or twice.
    #[error("could not find pristine state for this editor")]
    MissingPristineState,

    /// An operation addressed a node that has not been assigned a `_key`.
    #[error("node at {0} has no _key")]
    MissingKey(String),

    /// A type name unknown to the schema.
    #[error("unknown type: {0}")]
    UnknownType(SmolStr),

    /// An operation position does not resolve to a node.
    #[error("position out of bounds: {0}")]
    OutOfBounds(String),

    /// No node with the given key.
    #[error("no node with key {0:?}")]
    NodeNotFound(SmolStr),

    /// The operation does not make sense for the targeted node shape.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Patch application or inversion failed.
    #[error(transparent)]
    Patch(#[from] PatchError),
}
