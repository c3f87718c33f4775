//! Operation-to-patch translation.
//!
//! Pure mapping from a primitive operation plus the *pre-operation* document
//! to an ordered list of patches. Applying the patches to the pre-operation
//! value yields the post-operation value.
//!
//! Patches address nodes by key path only. Numeric indices would break under
//! concurrent remote edits that reorder siblings, so any operation that
//! targets a node without a `_key` is rejected; the object-keys plugin runs
//! earlier in the chain and is expected to have assigned keys already.

use serde_json::{Map, Value};
use smol_str::SmolStr;
use stanza_patch::{InsertPosition, Patch, Path, diff_text};
use stanza_types::{Block, Child, Document, SchemaTypes, Span, TextBlock};

use crate::error::EditorError;
use crate::operation::{Node, NodePosition, Operation, TextPoint};

/// Translate one operation into zero or more patches.
pub fn translate(
    op: &Operation,
    doc: &Document,
    schema: &SchemaTypes,
) -> Result<Vec<Patch>, EditorError> {
    match op {
        Operation::InsertText { at, text } => {
            let (path, span) = span_at(doc, *at)?;
            let mut new_text = span.text.clone();
            let byte = char_to_byte(&new_text, at.offset)?;
            new_text.insert_str(byte, text);
            Ok(vec![Patch::Set {
                path,
                value: Value::String(new_text),
            }])
        }
        Operation::RemoveText { at, len } => {
            let (path, span) = span_at(doc, *at)?;
            let mut new_text = span.text.clone();
            let start = char_to_byte(&new_text, at.offset)?;
            let end = char_to_byte(&new_text, at.offset + len)?;
            new_text.replace_range(start..end, "");
            Ok(vec![Patch::Set {
                path,
                value: Value::String(new_text),
            }])
        }
        Operation::InsertNode { at, node } => translate_insert_node(doc, schema, *at, node),
        Operation::RemoveNode { at } => {
            let path = node_path(doc, *at)?;
            Ok(vec![Patch::Unset { path }])
        }
        Operation::SplitNode {
            at,
            new_block_key,
            new_child_key,
        } => translate_split(doc, *at, new_block_key.as_ref(), new_child_key.as_ref()),
        Operation::MergeNode { at } => translate_merge(doc, *at),
        Operation::MoveNode { from, to } => translate_move(doc, *from, *to),
        Operation::SetNode { at, props } => translate_set_node(doc, *at, props),
        // Selection is derived state; nothing to persist.
        Operation::SetSelection { .. } => Ok(Vec::new()),
    }
}

fn out_of_bounds(what: impl Into<String>) -> EditorError {
    EditorError::OutOfBounds(what.into())
}

fn keyed(key: &SmolStr, what: &str) -> Result<SmolStr, EditorError> {
    if key.is_empty() {
        Err(EditorError::MissingKey(what.to_string()))
    } else {
        Ok(key.clone())
    }
}

fn block_at(doc: &Document, idx: usize) -> Result<&Block, EditorError> {
    doc.blocks
        .get(idx)
        .ok_or_else(|| out_of_bounds(format!("block {idx} of {}", doc.len())))
}

fn text_block_at(doc: &Document, idx: usize) -> Result<&TextBlock, EditorError> {
    block_at(doc, idx)?
        .as_text()
        .ok_or_else(|| EditorError::InvalidOperation(format!("block {idx} is not a text block")))
}

fn span_at(doc: &Document, at: TextPoint) -> Result<(Path, &Span), EditorError> {
    let block = text_block_at(doc, at.block)?;
    let block_key = keyed(&block.key, &format!("block {}", at.block))?;
    let child = block
        .children
        .get(at.child)
        .ok_or_else(|| out_of_bounds(format!("child {} of {}", at.child, block.children.len())))?;
    let span = child
        .as_span()
        .ok_or_else(|| EditorError::InvalidOperation(format!("child {} is not a span", at.child)))?;
    let child_key = keyed(&span.key, &format!("child {}", at.child))?;
    Ok((Path::block(block_key).child(child_key).attr("text"), span))
}

fn node_path(doc: &Document, at: NodePosition) -> Result<Path, EditorError> {
    let block = block_at(doc, at.block)?;
    let block_key = keyed(block.key(), &format!("block {}", at.block))?;
    match at.child {
        None => Ok(Path::block(block_key)),
        Some(child) => {
            let text = text_block_at(doc, at.block)?;
            let c = text
                .children
                .get(child)
                .ok_or_else(|| out_of_bounds(format!("child {child} of {}", text.children.len())))?;
            let child_key = keyed(c.key(), &format!("child {child}"))?;
            Ok(Path::block(block_key).child(child_key))
        }
    }
}

/// Anchor for inserting at index `idx` into a sibling list.
fn block_anchor(doc: &Document, idx: usize) -> Result<(Path, InsertPosition), EditorError> {
    if idx == 0 {
        return Ok((Path::root(), InsertPosition::Before));
    }
    let prev = block_at(doc, idx - 1)?;
    let key = keyed(prev.key(), &format!("block {}", idx - 1))?;
    Ok((Path::block(key), InsertPosition::After))
}

fn child_anchor(
    doc: &Document,
    block: usize,
    idx: usize,
) -> Result<(Path, InsertPosition), EditorError> {
    let text = text_block_at(doc, block)?;
    let block_key = keyed(&text.key, &format!("block {block}"))?;
    if idx == 0 {
        return Ok((
            Path::block(block_key).attr("children"),
            InsertPosition::Before,
        ));
    }
    let prev = text
        .children
        .get(idx - 1)
        .ok_or_else(|| out_of_bounds(format!("child {} of {}", idx - 1, text.children.len())))?;
    let prev_key = keyed(prev.key(), &format!("child {}", idx - 1))?;
    Ok((Path::block(block_key).child(prev_key), InsertPosition::After))
}

fn translate_insert_node(
    doc: &Document,
    schema: &SchemaTypes,
    at: NodePosition,
    node: &Node,
) -> Result<Vec<Patch>, EditorError> {
    keyed(node.key(), "inserted node")?;
    let known = match node {
        Node::Block(_) => schema.block_level_type(node.type_name()),
        Node::Child(_) => schema.child_level_type(node.type_name()),
    };
    if !known {
        return Err(EditorError::UnknownType(node.type_name().clone()));
    }
    let item = serde_json::to_value(node).map_err(stanza_patch::PatchError::from)?;
    let (path, position) = match (at.child, node) {
        (None, Node::Block(_)) => {
            if at.block > doc.len() {
                return Err(out_of_bounds(format!("block {} of {}", at.block, doc.len())));
            }
            block_anchor(doc, at.block)?
        }
        (Some(child), Node::Child(_)) => {
            let text = text_block_at(doc, at.block)?;
            if child > text.children.len() {
                return Err(out_of_bounds(format!(
                    "child {child} of {}",
                    text.children.len()
                )));
            }
            child_anchor(doc, at.block, child)?
        }
        _ => {
            return Err(EditorError::InvalidOperation(
                "node shape does not match insert position".into(),
            ));
        }
    };
    Ok(vec![Patch::Insert {
        path,
        position,
        items: vec![item],
    }])
}

fn translate_split(
    doc: &Document,
    at: TextPoint,
    new_block_key: Option<&SmolStr>,
    new_child_key: Option<&SmolStr>,
) -> Result<Vec<Patch>, EditorError> {
    let new_block_key = new_block_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| EditorError::MissingKey("split: new block".into()))?;
    let new_child_key = new_child_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| EditorError::MissingKey("split: new child".into()))?;

    let block = text_block_at(doc, at.block)?;
    let block_key = keyed(&block.key, &format!("block {}", at.block))?;
    let (text_path, span) = span_at(doc, at)?;

    let byte = char_to_byte(&span.text, at.offset)?;
    let left = &span.text[..byte];
    let right = &span.text[byte..];

    let mut right_span = Span::new(new_child_key.clone(), span.type_name.clone(), right);
    right_span.marks = span.marks.clone();

    let moved: Vec<Child> = block.children[at.child + 1..].to_vec();
    let new_block = TextBlock {
        key: new_block_key.clone(),
        type_name: block.type_name.clone(),
        style: block.style.clone(),
        list_item: block.list_item.clone(),
        level: block.level,
        children: std::iter::once(Child::Span(right_span)).chain(moved).collect(),
        mark_defs: block.mark_defs.clone(),
    };

    let insert = Patch::Insert {
        path: Path::block(block_key.clone()),
        position: InsertPosition::After,
        items: vec![serde_json::to_value(Block::Text(new_block)).map_err(stanza_patch::PatchError::from)?],
    };

    let truncate = if at.child + 1 == block.children.len() {
        // Only the split span changes; set its text directly.
        Patch::Set {
            path: text_path,
            value: Value::String(left.to_string()),
        }
    } else {
        // Trailing children move away too; rewrite the children array.
        let mut truncated_span = span.clone();
        truncated_span.text = left.to_string();
        let mut remaining: Vec<Child> = block.children[..at.child].to_vec();
        remaining.push(Child::Span(truncated_span));
        Patch::Set {
            path: Path::block(block_key).attr("children"),
            value: serde_json::to_value(remaining).map_err(stanza_patch::PatchError::from)?,
        }
    };

    Ok(vec![insert, truncate])
}

fn translate_merge(doc: &Document, at: NodePosition) -> Result<Vec<Patch>, EditorError> {
    match at.child {
        None => {
            if at.block == 0 {
                return Err(out_of_bounds("cannot merge the first block"));
            }
            let prev = text_block_at(doc, at.block - 1)?;
            let cur = text_block_at(doc, at.block)?;
            let prev_key = keyed(&prev.key, &format!("block {}", at.block - 1))?;
            let cur_key = keyed(&cur.key, &format!("block {}", at.block))?;

            let mut patches = Vec::new();
            if !cur.mark_defs.is_empty() {
                let mut defs = prev.mark_defs.clone();
                for def in &cur.mark_defs {
                    if !defs.iter().any(|d| d.key == def.key) {
                        defs.push(def.clone());
                    }
                }
                patches.push(Patch::Set {
                    path: Path::block(prev_key.clone()).attr("markDefs"),
                    value: serde_json::to_value(defs).map_err(stanza_patch::PatchError::from)?,
                });
            }
            let mut children = prev.children.clone();
            children.extend(cur.children.iter().cloned());
            patches.push(Patch::Set {
                path: Path::block(prev_key).attr("children"),
                value: serde_json::to_value(children).map_err(stanza_patch::PatchError::from)?,
            });
            patches.push(Patch::Unset {
                path: Path::block(cur_key),
            });
            Ok(patches)
        }
        Some(child) => {
            if child == 0 {
                return Err(out_of_bounds("cannot merge the first child"));
            }
            let prev_point = TextPoint::new(at.block, child - 1, 0);
            let cur_point = TextPoint::new(at.block, child, 0);
            let (prev_path, prev_span) = span_at(doc, prev_point)?;
            let (_, cur_span) = span_at(doc, cur_point)?;
            let merged = format!("{}{}", prev_span.text, cur_span.text);
            Ok(vec![
                Patch::Set {
                    path: prev_path,
                    value: Value::String(merged),
                },
                Patch::Unset {
                    path: node_path(doc, at)?,
                },
            ])
        }
    }
}

fn translate_move(
    doc: &Document,
    from: NodePosition,
    to: NodePosition,
) -> Result<Vec<Patch>, EditorError> {
    if from.child.is_some() || to.child.is_some() {
        return Err(EditorError::InvalidOperation(
            "move is only supported for blocks".into(),
        ));
    }
    let block = block_at(doc, from.block)?;
    let key = keyed(block.key(), &format!("block {}", from.block))?;
    let item = serde_json::to_value(block).map_err(stanza_patch::PatchError::from)?;

    // Anchor computed against the document as it looks after the removal.
    let mut remaining: Vec<&Block> = doc.blocks.iter().collect();
    remaining.remove(from.block);
    let dest = to.block.min(remaining.len());
    let (path, position) = if dest == 0 {
        (Path::root(), InsertPosition::Before)
    } else {
        let prev = remaining[dest - 1];
        (
            Path::block(keyed(prev.key(), "move anchor")?),
            InsertPosition::After,
        )
    };

    Ok(vec![
        Patch::Unset {
            path: Path::block(key),
        },
        Patch::Insert {
            path,
            position,
            items: vec![item],
        },
    ])
}

fn translate_set_node(
    doc: &Document,
    at: NodePosition,
    props: &Map<String, Value>,
) -> Result<Vec<Patch>, EditorError> {
    let mut patches = Vec::new();
    for (prop, value) in props {
        match prop.as_str() {
            // Key assignment cannot be addressed by key path; rewrite the
            // enclosing container instead.
            "_key" => patches.push(translate_key_assignment(doc, at, value)?),
            // Span text rewrites become diffs; a `text` field on anything
            // that is not a span is just another property.
            "text" => match span_target(doc, at) {
                Some((path, span)) => {
                    let new_text = value.as_str().ok_or_else(|| {
                        EditorError::InvalidOperation("text must be a string".into())
                    })?;
                    let deltas = diff_text(&span.text, new_text);
                    if !deltas.is_empty() {
                        patches.push(Patch::DiffMatchPatch { path, deltas });
                    }
                }
                None => {
                    let path = node_path(doc, at)?.attr("text");
                    if value.is_null() {
                        patches.push(Patch::Unset { path });
                    } else {
                        patches.push(Patch::Set {
                            path,
                            value: value.clone(),
                        });
                    }
                }
            },
            _ => {
                let path = node_path(doc, at)?.attr(prop.as_str());
                if value.is_null() {
                    patches.push(Patch::Unset { path });
                } else {
                    patches.push(Patch::Set {
                        path,
                        value: value.clone(),
                    });
                }
            }
        }
    }
    Ok(patches)
}

/// The span a `text` property rewrite addresses, if the position resolves
/// to one.
fn span_target(doc: &Document, at: NodePosition) -> Option<(Path, &Span)> {
    let child = at.child?;
    span_at(doc, TextPoint::new(at.block, child, 0)).ok()
}

/// A `_key` assignment targets a node that (typically) has no key yet, so it
/// cannot be addressed by key path. Emit a whole-container rewrite: the
/// parent block for children, the document root for blocks.
fn translate_key_assignment(
    doc: &Document,
    at: NodePosition,
    value: &Value,
) -> Result<Patch, EditorError> {
    let new_key = value
        .as_str()
        .ok_or_else(|| EditorError::InvalidOperation("_key must be a string".into()))?;
    match at.child {
        None => {
            let mut blocks = doc.blocks.clone();
            let block = blocks
                .get_mut(at.block)
                .ok_or_else(|| out_of_bounds(format!("block {} of {}", at.block, doc.len())))?;
            block.set_key(SmolStr::new(new_key));
            Ok(Patch::Set {
                path: Path::root(),
                value: serde_json::to_value(blocks).map_err(stanza_patch::PatchError::from)?,
            })
        }
        Some(child) => {
            let text = text_block_at(doc, at.block)?;
            let block_key = keyed(&text.key, &format!("block {}", at.block))?;
            let mut block = text.clone();
            let c = block
                .children
                .get_mut(child)
                .ok_or_else(|| out_of_bounds(format!("child {child} of {}", text.children.len())))?;
            c.set_key(SmolStr::new(new_key));
            Ok(Patch::Set {
                path: Path::block(block_key),
                value: serde_json::to_value(Block::Text(block))
                    .map_err(stanza_patch::PatchError::from)?,
            })
        }
    }
}

fn char_to_byte(s: &str, offset: usize) -> Result<usize, EditorError> {
    if offset == 0 {
        return Ok(0);
    }
    s.char_indices()
        .nth(offset - 1)
        .map(|(i, c)| i + c.len_utf8())
        .ok_or_else(|| {
            out_of_bounds(format!("offset {offset} in text of {} chars", s.chars().count()))
        })
}
