//! Patch inversion for undo.
//!
//! Inverting a patch requires the document as it was *before* the patch was
//! applied, since unset and overwrite patches discard state.

use serde_json::Value;
use stanza_types::Document;

use crate::apply::{apply, resolve};
use crate::diff::invert_deltas;
use crate::error::PatchError;
use crate::patch::{InsertPosition, Patch};
use crate::path::{Path, PathSegment};

/// Invert one patch against the pre-patch document.
///
/// Returns zero or more patches: inverting an insert of N items produces N
/// unsets.
pub fn invert(patch: &Patch, before: &Document) -> Result<Vec<Patch>, PatchError> {
    match patch {
        Patch::Set { path, .. } => Ok(vec![match resolve(before, path) {
            Some(old) => Patch::Set {
                path: path.clone(),
                value: old,
            },
            None => Patch::Unset { path: path.clone() },
        }]),
        Patch::Unset { path } => invert_unset(path, before),
        Patch::Insert { path, items, .. } => invert_insert(path, items),
        Patch::DiffMatchPatch { path, deltas } => Ok(vec![Patch::DiffMatchPatch {
            path: path.clone(),
            deltas: invert_deltas(deltas),
        }]),
    }
}

/// Invert an ordered batch.
///
/// Each patch is inverted against the document state it actually saw, then
/// the list is reversed so the result undoes the batch when applied in order.
pub fn invert_batch(patches: &[Patch], before: &Document) -> Result<Vec<Patch>, PatchError> {
    let mut scratch = before.clone();
    let mut inverses = Vec::with_capacity(patches.len());
    for patch in patches {
        inverses.push(invert(patch, &scratch)?);
        apply(&mut scratch, patch)?;
    }
    Ok(inverses.into_iter().rev().flatten().collect())
}

fn invert_unset(path: &Path, before: &Document) -> Result<Vec<Patch>, PatchError> {
    let Some(old) = resolve(before, path) else {
        // Unsetting something already absent undoes to the same no-op.
        return Ok(vec![Patch::Unset { path: path.clone() }]);
    };
    match path.segments() {
        [PathSegment::Key(b)] => {
            let idx = before
                .index_of(b)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            Ok(vec![reinsert_at(before, idx, old)])
        }
        [PathSegment::Key(b), PathSegment::Attr(children), PathSegment::Key(c)]
            if children == "children" =>
        {
            let text = before
                .block_by_key(b)
                .and_then(|blk| blk.as_text())
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            let idx = text
                .index_of_child(c)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            let anchor = if idx > 0 {
                (
                    Path::block(b.clone()).child(text.children[idx - 1].key().clone()),
                    InsertPosition::After,
                )
            } else {
                (
                    Path::block(b.clone()).attr("children"),
                    InsertPosition::Before,
                )
            };
            Ok(vec![Patch::Insert {
                path: anchor.0,
                position: anchor.1,
                items: vec![old],
            }])
        }
        // Attribute unsets restore the old value.
        _ => Ok(vec![Patch::Set {
            path: path.clone(),
            value: old,
        }]),
    }
}

fn reinsert_at(before: &Document, idx: usize, item: Value) -> Patch {
    if idx > 0 {
        Patch::Insert {
            path: Path::block(before.blocks[idx - 1].key().clone()),
            position: InsertPosition::After,
            items: vec![item],
        }
    } else {
        Patch::Insert {
            path: Path::root(),
            position: InsertPosition::Before,
            items: vec![item],
        }
    }
}

fn invert_insert(path: &Path, items: &[Value]) -> Result<Vec<Patch>, PatchError> {
    let child_level = matches!(
        path.segments(),
        [_, PathSegment::Attr(a)] | [_, PathSegment::Attr(a), _] if a == "children"
    );
    items
        .iter()
        .map(|item| {
            let key = item
                .get("_key")
                .and_then(Value::as_str)
                .ok_or_else(|| PatchError::Malformed("inserted item without _key".into()))?;
            let target = if child_level {
                let block_key = path
                    .block_key()
                    .ok_or_else(|| PatchError::Malformed(format!("bad insert anchor: {path}")))?;
                Path::block(block_key.clone()).child(key)
            } else {
                Path::block(key)
            };
            Ok(Patch::Unset { path: target })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_all;
    use serde_json::json;

    fn doc() -> Document {
        serde_json::from_value(json!([
            {
                "_key": "a",
                "_type": "block",
                "style": "normal",
                "children": [
                    {"_key": "a1", "_type": "span", "text": "hello", "marks": []}
                ],
                "markDefs": []
            },
            {
                "_key": "b",
                "_type": "block",
                "style": "h1",
                "children": [
                    {"_key": "b1", "_type": "span", "text": "title", "marks": []}
                ],
                "markDefs": []
            }
        ]))
        .unwrap()
    }

    fn round_trip(patches: &[Patch]) {
        let before = doc();
        let mut after = before.clone();
        apply_all(&mut after, patches).unwrap();
        let inverse = invert_batch(patches, &before).unwrap();
        apply_all(&mut after, &inverse).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_invert_set() {
        round_trip(&[Patch::Set {
            path: Path::block("a").child("a1").attr("text"),
            value: json!("changed"),
        }]);
    }

    #[test]
    fn test_invert_unset_block_restores_position() {
        round_trip(&[Patch::Unset {
            path: Path::block("a"),
        }]);
        round_trip(&[Patch::Unset {
            path: Path::block("b"),
        }]);
    }

    #[test]
    fn test_invert_insert() {
        round_trip(&[Patch::Insert {
            path: Path::block("a"),
            position: InsertPosition::After,
            items: vec![json!({
                "_key": "c",
                "_type": "block",
                "style": "normal",
                "children": [{"_key": "c1", "_type": "span", "text": "x", "marks": []}],
                "markDefs": []
            })],
        }]);
    }

    #[test]
    fn test_invert_batch_order() {
        // A batch whose patches depend on each other must invert cleanly.
        round_trip(&[
            Patch::Set {
                path: Path::block("a").child("a1").attr("text"),
                value: json!("hel"),
            },
            Patch::Unset {
                path: Path::block("b"),
            },
        ]);
    }

    #[test]
    fn test_invert_set_of_absent_attr_is_unset() {
        let before = doc();
        let patch = Patch::Set {
            path: Path::block("a").attr("level"),
            value: json!(1),
        };
        let inverse = invert(&patch, &before).unwrap();
        assert_eq!(
            inverse,
            vec![Patch::Unset {
                path: Path::block("a").attr("level")
            }]
        );
    }
}
