//! Block count ceiling.
//!
//! When a maximum block count is configured, operations that would add a
//! top-level block are vetoed once the document is at the limit. Everything
//! else (edits inside blocks, removals, moves) stays allowed.

use tracing::debug;

use crate::operation::Operation;
use crate::plugin::{ApplyDecision, BehaviorPlugin, PluginCtx};
use crate::stream::{BlockedReason, ChangeEvent};
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct MaxBlocksPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for MaxBlocksPlugin {
    fn name(&self) -> &'static str {
        "max-blocks"
    }

    fn intercept_apply(&mut self, op: &mut Operation, ctx: &mut PluginCtx<'_, S>) -> ApplyDecision {
        let Some(limit) = ctx.state.max_blocks else {
            return ApplyDecision::Continue;
        };
        if !op.grows_block_count() || ctx.surface.value().len() < limit {
            return ApplyDecision::Continue;
        }
        debug!(limit, "vetoing operation over block limit");
        ctx.state.change_hub.emit(&ChangeEvent::Blocked {
            reason: BlockedReason::MaxBlocks,
        });
        ApplyDecision::Veto
    }
}
