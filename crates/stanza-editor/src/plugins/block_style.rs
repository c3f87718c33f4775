//! Block style defaults.
//!
//! Text blocks with a missing or unknown style fall back to the schema's
//! normal style.

use serde_json::{Map, Value};

use crate::operation::{NodePosition, Operation};
use crate::plugin::{BehaviorPlugin, PluginCtx};
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct BlockStylePlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for BlockStylePlugin {
    fn name(&self) -> &'static str {
        "block-style"
    }

    fn normalize(&mut self, ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        let schema = &ctx.state.schema;
        let mut repairs = Vec::new();
        for (b, block) in ctx.doc().blocks.iter().enumerate() {
            let Some(text) = block.as_text() else { continue };
            if text.key.is_empty() || schema.style_allowed(&text.style) {
                continue;
            }
            let mut props = Map::new();
            props.insert(
                "style".into(),
                Value::String(schema.normal_style.to_string()),
            );
            repairs.push(Operation::SetNode {
                at: NodePosition::block(b),
                props,
            });
        }
        repairs
    }
}
