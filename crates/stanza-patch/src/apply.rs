//! Patch application against a `Document`.

use serde_json::Value;
use smol_str::SmolStr;
use stanza_types::{Block, Child, Document, MarkDef};

use crate::diff::apply_deltas;
use crate::error::PatchError;
use crate::patch::{InsertPosition, Patch};
use crate::path::{Path, PathSegment};

/// Apply a batch in emission order. Stops at the first failure.
pub fn apply_all(doc: &mut Document, patches: &[Patch]) -> Result<(), PatchError> {
    for patch in patches {
        apply(doc, patch)?;
    }
    Ok(())
}

/// Apply a single patch to the document.
pub fn apply(doc: &mut Document, patch: &Patch) -> Result<(), PatchError> {
    match patch {
        Patch::Set { path, value } => apply_set(doc, path, value),
        Patch::Unset { path } => apply_unset(doc, path),
        Patch::Insert {
            path,
            position,
            items,
        } => apply_insert(doc, path, *position, items),
        Patch::DiffMatchPatch { path, deltas } => {
            let span = span_mut(doc, path)?;
            span.text = apply_deltas(&span.text, deltas)?;
            Ok(())
        }
    }
}

/// Resolve a path to the JSON value it addresses, if present.
pub fn resolve(doc: &Document, path: &Path) -> Option<Value> {
    let mut value = serde_json::to_value(doc).ok()?;
    for segment in path.segments() {
        value = match segment {
            PathSegment::Key(key) => value
                .as_array()?
                .iter()
                .find(|v| v.get("_key").and_then(Value::as_str) == Some(key.as_str()))?
                .clone(),
            PathSegment::Attr(attr) => value.get(attr.as_str())?.clone(),
            PathSegment::Index(i) => value.as_array()?.get(*i)?.clone(),
        };
    }
    Some(value)
}

fn not_found(path: &Path) -> PatchError {
    PatchError::PathNotFound(path.to_string())
}

fn malformed(path: &Path, why: &str) -> PatchError {
    PatchError::Malformed(format!("{why}: {path}"))
}

fn block_mut<'a>(doc: &'a mut Document, path: &Path, key: &str) -> Result<&'a mut Block, PatchError> {
    doc.block_by_key_mut(key).ok_or_else(|| not_found(path))
}

fn child_mut<'a>(
    doc: &'a mut Document,
    path: &Path,
    block_key: &str,
    child_key: &str,
) -> Result<&'a mut Child, PatchError> {
    let block = block_mut(doc, path, block_key)?;
    let text = block
        .as_text_mut()
        .ok_or_else(|| malformed(path, "children on non-text block"))?;
    text.child_by_key_mut(child_key).ok_or_else(|| not_found(path))
}

fn span_mut<'a>(
    doc: &'a mut Document,
    path: &Path,
) -> Result<&'a mut stanza_types::Span, PatchError> {
    match path.segments() {
        [
            PathSegment::Key(b),
            PathSegment::Attr(children),
            PathSegment::Key(c),
            PathSegment::Attr(text),
        ] if children == "children" && text == "text" => {
            let child = child_mut(doc, path, b, c)?;
            child
                .as_span_mut()
                .ok_or_else(|| malformed(path, "text on non-span child"))
        }
        _ => Err(malformed(path, "not a text path")),
    }
}

fn apply_set(doc: &mut Document, path: &Path, value: &Value) -> Result<(), PatchError> {
    match path.segments() {
        [] => {
            doc.blocks = serde_json::from_value(value.clone())?;
            Ok(())
        }
        [PathSegment::Key(b)] => {
            let block = block_mut(doc, path, b)?;
            *block = serde_json::from_value(value.clone())?;
            Ok(())
        }
        [PathSegment::Key(b), PathSegment::Attr(attr)] => {
            let block = block_mut(doc, path, b)?;
            set_block_attr(block, path, attr, value)
        }
        [PathSegment::Key(b), PathSegment::Attr(children), PathSegment::Key(c)]
            if children == "children" =>
        {
            let child = child_mut(doc, path, b, c)?;
            *child = serde_json::from_value(value.clone())?;
            Ok(())
        }
        [
            PathSegment::Key(b),
            PathSegment::Attr(children),
            PathSegment::Key(c),
            PathSegment::Attr(attr),
        ] if children == "children" => {
            let child = child_mut(doc, path, b, c)?;
            set_child_attr(child, path, attr, value)
        }
        _ => Err(malformed(path, "unsupported set path")),
    }
}

fn set_block_attr(
    block: &mut Block,
    path: &Path,
    attr: &str,
    value: &Value,
) -> Result<(), PatchError> {
    match (block, attr) {
        (block, "_key") => {
            block.set_key(smol(value, path)?);
            Ok(())
        }
        (Block::Text(b), "style") => {
            b.style = smol(value, path)?;
            Ok(())
        }
        (Block::Text(b), "listItem") => {
            b.list_item = if value.is_null() {
                None
            } else {
                Some(smol(value, path)?)
            };
            Ok(())
        }
        (Block::Text(b), "level") => {
            b.level = if value.is_null() {
                None
            } else {
                Some(
                    value
                        .as_u64()
                        .ok_or_else(|| malformed(path, "level must be an integer"))?
                        as u32,
                )
            };
            Ok(())
        }
        (Block::Text(b), "markDefs") => {
            b.mark_defs = serde_json::from_value::<Vec<MarkDef>>(value.clone())?;
            Ok(())
        }
        (Block::Text(b), "children") => {
            b.children = serde_json::from_value::<Vec<Child>>(value.clone())?;
            Ok(())
        }
        (Block::Object(b), attr) => {
            if value.is_null() {
                b.fields.remove(attr);
            } else {
                b.fields.insert(attr.to_string(), value.clone());
            }
            Ok(())
        }
        _ => Err(malformed(path, "unknown block attribute")),
    }
}

fn set_child_attr(
    child: &mut Child,
    path: &Path,
    attr: &str,
    value: &Value,
) -> Result<(), PatchError> {
    match (child, attr) {
        (child, "_key") => {
            child.set_key(smol(value, path)?);
            Ok(())
        }
        (Child::Span(s), "text") => {
            s.text = value
                .as_str()
                .ok_or_else(|| malformed(path, "text must be a string"))?
                .to_string();
            Ok(())
        }
        (Child::Span(s), "marks") => {
            s.marks = serde_json::from_value::<Vec<SmolStr>>(value.clone())?;
            Ok(())
        }
        (Child::InlineObject(o), attr) => {
            if value.is_null() {
                o.fields.remove(attr);
            } else {
                o.fields.insert(attr.to_string(), value.clone());
            }
            Ok(())
        }
        _ => Err(malformed(path, "unknown child attribute")),
    }
}

fn smol(value: &Value, path: &Path) -> Result<SmolStr, PatchError> {
    value
        .as_str()
        .map(SmolStr::new)
        .ok_or_else(|| malformed(path, "expected a string"))
}

fn apply_unset(doc: &mut Document, path: &Path) -> Result<(), PatchError> {
    match path.segments() {
        [] => Err(malformed(path, "cannot unset the document root")),
        [PathSegment::Key(b)] => {
            let idx = doc.index_of(b).ok_or_else(|| not_found(path))?;
            doc.blocks.remove(idx);
            Ok(())
        }
        [PathSegment::Key(b), PathSegment::Attr(attr)] => {
            let block = block_mut(doc, path, b)?;
            set_block_attr(block, path, attr, &Value::Null)
        }
        [PathSegment::Key(b), PathSegment::Attr(children), PathSegment::Key(c)]
            if children == "children" =>
        {
            let block = block_mut(doc, path, b)?;
            let text = block
                .as_text_mut()
                .ok_or_else(|| malformed(path, "children on non-text block"))?;
            let idx = text.index_of_child(c).ok_or_else(|| not_found(path))?;
            text.children.remove(idx);
            Ok(())
        }
        [
            PathSegment::Key(b),
            PathSegment::Attr(children),
            PathSegment::Key(c),
            PathSegment::Attr(attr),
        ] if children == "children" => {
            let child = child_mut(doc, path, b, c)?;
            match (child, attr.as_str()) {
                (Child::Span(s), "text") => {
                    s.text.clear();
                    Ok(())
                }
                (Child::Span(s), "marks") => {
                    s.marks.clear();
                    Ok(())
                }
                (Child::InlineObject(o), attr) => {
                    o.fields.remove(attr);
                    Ok(())
                }
                _ => Err(malformed(path, "unknown child attribute")),
            }
        }
        _ => Err(malformed(path, "unsupported unset path")),
    }
}

fn apply_insert(
    doc: &mut Document,
    path: &Path,
    position: InsertPosition,
    items: &[Value],
) -> Result<(), PatchError> {
    match path.segments() {
        // Container anchors: root and `.children`.
        [] => {
            let blocks = decode_blocks(items)?;
            let at = match position {
                InsertPosition::Before => 0,
                InsertPosition::After => doc.blocks.len(),
            };
            doc.blocks.splice(at..at, blocks);
            Ok(())
        }
        [PathSegment::Key(b), PathSegment::Attr(children)] if children == "children" => {
            let block = block_mut(doc, path, b)?;
            let text = block
                .as_text_mut()
                .ok_or_else(|| malformed(path, "children on non-text block"))?;
            let items = decode_children(items)?;
            let at = match position {
                InsertPosition::Before => 0,
                InsertPosition::After => text.children.len(),
            };
            text.children.splice(at..at, items);
            Ok(())
        }
        // Item anchors.
        [PathSegment::Key(b)] => {
            let blocks = decode_blocks(items)?;
            let idx = doc.index_of(b).ok_or_else(|| not_found(path))?;
            let at = match position {
                InsertPosition::Before => idx,
                InsertPosition::After => idx + 1,
            };
            doc.blocks.splice(at..at, blocks);
            Ok(())
        }
        [PathSegment::Key(b), PathSegment::Attr(children), PathSegment::Key(c)]
            if children == "children" =>
        {
            let block = block_mut(doc, path, b)?;
            let text = block
                .as_text_mut()
                .ok_or_else(|| malformed(path, "children on non-text block"))?;
            let idx = text.index_of_child(c).ok_or_else(|| not_found(path))?;
            let items = decode_children(items)?;
            let at = match position {
                InsertPosition::Before => idx,
                InsertPosition::After => idx + 1,
            };
            text.children.splice(at..at, items);
            Ok(())
        }
        _ => Err(malformed(path, "unsupported insert anchor")),
    }
}

fn decode_blocks(items: &[Value]) -> Result<Vec<Block>, PatchError> {
    items
        .iter()
        .map(|v| serde_json::from_value::<Block>(v.clone()).map_err(PatchError::from))
        .collect()
}

fn decode_children(items: &[Value]) -> Result<Vec<Child>, PatchError> {
    items
        .iter()
        .map(|v| serde_json::from_value::<Child>(v.clone()).map_err(PatchError::from))
        .collect()
}
