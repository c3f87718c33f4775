//! Structured text deltas for diffMatchPatch patches.
//!
//! A delta list rewrites one string into another: keep N chars, insert a
//! string, delete a string. Deltas are produced by trimming the common
//! prefix and suffix of old and new text, which is exact for single-edit
//! rewrites (typing, deleting a range, IME commits).

use serde::{Deserialize, Serialize};

use crate::error::PatchError;

/// One step of a text rewrite. Counts and contents are in characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextDelta {
    /// Keep the next `n` characters.
    Keep(usize),
    /// Insert a string at the current position.
    Insert(String),
    /// Delete the given string (must match the text at the current position).
    Delete(String),
}

/// Compute deltas rewriting `old` into `new`.
pub fn diff_text(old: &str, new: &str) -> Vec<TextDelta> {
    if old == new {
        return Vec::new();
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let mut prefix = 0;
    while prefix < old_chars.len()
        && prefix < new_chars.len()
        && old_chars[prefix] == new_chars[prefix]
    {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < old_chars.len() - prefix
        && suffix < new_chars.len() - prefix
        && old_chars[old_chars.len() - 1 - suffix] == new_chars[new_chars.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let deleted: String = old_chars[prefix..old_chars.len() - suffix].iter().collect();
    let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();

    let mut deltas = Vec::new();
    if prefix > 0 {
        deltas.push(TextDelta::Keep(prefix));
    }
    if !deleted.is_empty() {
        deltas.push(TextDelta::Delete(deleted));
    }
    if !inserted.is_empty() {
        deltas.push(TextDelta::Insert(inserted));
    }
    if suffix > 0 {
        deltas.push(TextDelta::Keep(suffix));
    }
    deltas
}

/// Apply deltas to `old`, producing the rewritten string.
pub fn apply_deltas(old: &str, deltas: &[TextDelta]) -> Result<String, PatchError> {
    let chars: Vec<char> = old.chars().collect();
    let mut pos = 0usize;
    let mut out = String::new();
    for delta in deltas {
        match delta {
            TextDelta::Keep(n) => {
                let end = pos + n;
                if end > chars.len() {
                    return Err(PatchError::DeltaMismatch {
                        at: pos,
                        expected: format!("{n} more chars"),
                    });
                }
                out.extend(&chars[pos..end]);
                pos = end;
            }
            TextDelta::Insert(s) => out.push_str(s),
            TextDelta::Delete(s) => {
                let expected: Vec<char> = s.chars().collect();
                let end = pos + expected.len();
                if end > chars.len() || chars[pos..end] != expected[..] {
                    return Err(PatchError::DeltaMismatch {
                        at: pos,
                        expected: s.clone(),
                    });
                }
                pos = end;
            }
        }
    }
    // Anything past the last delta is kept.
    out.extend(&chars[pos..]);
    Ok(out)
}

/// Swap inserts and deletes, producing the deltas that undo this rewrite.
pub fn invert_deltas(deltas: &[TextDelta]) -> Vec<TextDelta> {
    deltas
        .iter()
        .map(|d| match d {
            TextDelta::Keep(n) => TextDelta::Keep(*n),
            TextDelta::Insert(s) => TextDelta::Delete(s.clone()),
            TextDelta::Delete(s) => TextDelta::Insert(s.clone()),
        })
        .collect()
}
