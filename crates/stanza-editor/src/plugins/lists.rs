//! List item consistency.
//!
//! Clears list membership the schema does not allow, clamps nesting levels
//! into `1..=max_list_level`, and drops orphaned levels on non-list blocks.

use serde_json::{Map, Value};

use crate::operation::{NodePosition, Operation};
use crate::plugin::{BehaviorPlugin, PluginCtx};
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct ListsPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for ListsPlugin {
    fn name(&self) -> &'static str {
        "lists"
    }

    fn normalize(&mut self, ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        let schema = &ctx.state.schema;
        let mut repairs = Vec::new();
        for (b, block) in ctx.doc().blocks.iter().enumerate() {
            let Some(text) = block.as_text() else { continue };
            if text.key.is_empty() {
                continue;
            }
            let mut props = Map::new();
            match &text.list_item {
                Some(kind) if !schema.supports_lists() || !schema.list_allowed(kind) => {
                    props.insert("listItem".into(), Value::Null);
                    props.insert("level".into(), Value::Null);
                }
                Some(_) => {
                    let level = text.level.unwrap_or(0);
                    let clamped = level.clamp(1, schema.max_list_level.max(1));
                    if text.level != Some(clamped) {
                        props.insert("level".into(), Value::from(clamped));
                    }
                }
                None => {
                    if text.level.is_some() {
                        props.insert("level".into(), Value::Null);
                    }
                }
            }
            if !props.is_empty() {
                repairs.push(Operation::SetNode {
                    at: NodePosition::block(b),
                    props,
                });
            }
        }
        repairs
    }
}
