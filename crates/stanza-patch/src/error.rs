//! Error types for patch application and inversion.

use thiserror::Error;

/// Errors that can occur while applying or inverting a patch.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PatchError {
    /// The path does not resolve to a node in the document.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The path shape is not valid for this patch kind.
    #[error("malformed patch: {0}")]
    Malformed(String),

    /// A text delta did not match the text it was applied to.
    #[error("text delta mismatch at char {at}: expected {expected:?}")]
    DeltaMismatch { at: usize, expected: String },

    /// A patch value could not be decoded into the node shape.
    #[error("invalid value: {0}")]
    Value(#[from] serde_json::Error),
}
