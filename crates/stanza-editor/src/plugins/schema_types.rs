//! Schema conformance.
//!
//! Vetoes insertion of nodes whose type the schema does not allow at the
//! target level, and repairs blocks that arrive with a missing type name.

use serde_json::{Map, Value};
use tracing::warn;

use crate::operation::{NodePosition, Operation};
use crate::plugin::{ApplyDecision, BehaviorPlugin, PluginCtx};
use crate::stream::{BlockedReason, ChangeEvent};
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct SchemaTypesPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for SchemaTypesPlugin {
    fn name(&self) -> &'static str {
        "schema-types"
    }

    fn intercept_apply(&mut self, op: &mut Operation, ctx: &mut PluginCtx<'_, S>) -> ApplyDecision {
        let Operation::InsertNode { at, node } = op else {
            return ApplyDecision::Continue;
        };
        let type_name = node.type_name();
        let allowed = match at.child {
            None => ctx.state.schema.block_level_type(type_name),
            Some(_) => ctx.state.schema.child_level_type(type_name),
        };
        if allowed {
            return ApplyDecision::Continue;
        }
        warn!(%type_name, "vetoing insert of unknown node type");
        ctx.state.change_hub.emit(&ChangeEvent::Blocked {
            reason: BlockedReason::UnknownType,
        });
        ApplyDecision::Veto
    }

    fn normalize(&mut self, ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        let mut repairs = Vec::new();
        for (b, block) in ctx.surface.value().blocks.iter().enumerate() {
            // Keyless blocks wait for the key plugin; their repair patches
            // would have no stable address yet.
            if block.key().is_empty() {
                continue;
            }
            let Some(text) = block.as_text() else { continue };
            if text.type_name.is_empty() {
                let mut props = Map::new();
                props.insert(
                    "_type".into(),
                    Value::String(ctx.state.schema.block_type.to_string()),
                );
                repairs.push(Operation::SetNode {
                    at: NodePosition::block(b),
                    props,
                });
            }
        }
        repairs
    }
}
