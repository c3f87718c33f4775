//! Mark and annotation hygiene.
//!
//! Keeps the span/markDefs relationship consistent:
//! - span marks must be schema decorators or keys of the owning block's
//!   `markDefs`; anything else is stripped,
//! - `markDefs` entries no span references are dropped,
//! - adjacent spans with identical marks are merged.
//!
//! Merges structurally shift child indices, so at most one merge is emitted
//! per normalization round and only when no attribute repairs are pending.

use serde_json::{Map, Value};
use tracing::debug;

use crate::operation::{NodePosition, Operation};
use crate::plugin::{BehaviorPlugin, PluginCtx};
use crate::surface::EditingSurface;
use stanza_types::TextBlock;

#[derive(Debug, Default)]
pub struct MarkModelPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for MarkModelPlugin {
    fn name(&self) -> &'static str {
        "mark-model"
    }

    fn normalize(&mut self, ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        let schema = &ctx.state.schema;
        let mut repairs = Vec::new();

        for (b, block) in ctx.surface.value().blocks.iter().enumerate() {
            let Some(text) = block.as_text() else { continue };
            if text.key.is_empty() {
                continue;
            }

            for (c, child) in text.children.iter().enumerate() {
                let Some(span) = child.as_span() else { continue };
                if span.key.is_empty() {
                    continue;
                }
                let resolved: Vec<_> = span
                    .marks
                    .iter()
                    .filter(|m| schema.is_decorator(m) || text.mark_def(m).is_some())
                    .cloned()
                    .collect();
                if resolved.len() != span.marks.len() {
                    debug!(block = %text.key, span = %span.key, "stripping unresolvable marks");
                    let mut props = Map::new();
                    props.insert(
                        "marks".into(),
                        Value::Array(
                            resolved
                                .iter()
                                .map(|m| Value::String(m.to_string()))
                                .collect(),
                        ),
                    );
                    repairs.push(Operation::SetNode {
                        at: NodePosition::child(b, c),
                        props,
                    });
                }
            }

            let referenced: Vec<_> = text
                .mark_defs
                .iter()
                .filter(|def| {
                    text.children.iter().any(|child| {
                        child
                            .as_span()
                            .is_some_and(|s| s.marks.iter().any(|m| *m == def.key))
                    })
                })
                .collect();
            if referenced.len() != text.mark_defs.len() {
                let mut props = Map::new();
                props.insert(
                    "markDefs".into(),
                    serde_json::to_value(&referenced).unwrap_or(Value::Array(Vec::new())),
                );
                repairs.push(Operation::SetNode {
                    at: NodePosition::block(b),
                    props,
                });
            }
        }

        if repairs.is_empty() {
            if let Some(merge) = first_mergeable(ctx) {
                repairs.push(merge);
            }
        }
        repairs
    }
}

/// First pair of adjacent same-marked spans, as a merge of the second into
/// the first.
fn first_mergeable<S: EditingSurface>(ctx: &PluginCtx<'_, S>) -> Option<Operation> {
    for (b, block) in ctx.surface.value().blocks.iter().enumerate() {
        let Some(text) = block.as_text() else { continue };
        if text.key.is_empty() || has_keyless_child(text) {
            continue;
        }
        for c in 1..text.children.len() {
            let (Some(prev), Some(cur)) =
                (text.children[c - 1].as_span(), text.children[c].as_span())
            else {
                continue;
            };
            if prev.marks == cur.marks {
                return Some(Operation::MergeNode {
                    at: NodePosition::child(b, c),
                });
            }
        }
    }
    None
}

fn has_keyless_child(text: &TextBlock) -> bool {
    text.children.iter().any(|c| c.key().is_empty())
}
