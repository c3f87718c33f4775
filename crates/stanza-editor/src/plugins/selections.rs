//! Selection validation and change notification.
//!
//! Drops selection updates that no longer address existing nodes, clears a
//! selection invalidated by a committed pass, and emits the settled
//! selection on the change stream.

use tracing::debug;

use crate::operation::Operation;
use crate::plugin::{ApplyDecision, BehaviorPlugin, CommitRecord, PluginCtx};
use crate::stream::ChangeEvent;
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct SelectionsPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for SelectionsPlugin {
    fn name(&self) -> &'static str {
        "selections"
    }

    fn intercept_apply(&mut self, op: &mut Operation, ctx: &mut PluginCtx<'_, S>) -> ApplyDecision {
        let Operation::SetSelection {
            selection: Some(selection),
        } = op
        else {
            return ApplyDecision::Continue;
        };
        if selection.is_valid(ctx.surface.value()) {
            return ApplyDecision::Continue;
        }
        debug!("vetoing selection pointing at missing nodes");
        ApplyDecision::Veto
    }

    fn on_commit(&mut self, commit: &CommitRecord, ctx: &mut PluginCtx<'_, S>) {
        let stale = ctx
            .surface
            .selection()
            .is_some_and(|sel| !sel.is_valid(ctx.surface.value()));
        if stale {
            ctx.surface.set_selection(None);
        }
        let settled = ctx.surface.selection().cloned();
        if stale || settled != commit.selection_before {
            ctx.state.change_hub.emit(&ChangeEvent::SelectionChanged { selection: settled });
        }
    }
}
