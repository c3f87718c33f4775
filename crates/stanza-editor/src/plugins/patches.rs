//! Patch publication.
//!
//! After each committed pass this plugin pushes the pass's patches to the
//! patch hub (for the document store) and a mutation event to the change
//! hub. Nothing is published before `subscribe` or after `unsubscribe`, and
//! selection-only passes produce no batch.

use stanza_patch::{PatchBatch, PatchOrigin};

use crate::plugin::{BehaviorPlugin, CommitRecord, PluginCtx};
use crate::stream::ChangeEvent;
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct PatchesPlugin {
    active: bool,
}

impl<S: EditingSurface> BehaviorPlugin<S> for PatchesPlugin {
    fn name(&self) -> &'static str {
        "patches"
    }

    fn on_commit(&mut self, commit: &CommitRecord, ctx: &mut PluginCtx<'_, S>) {
        if !self.active || ctx.state.read_only || commit.is_selection_only() {
            return;
        }
        let batch = PatchBatch {
            patches: commit.patches.clone(),
            snapshot: commit.snapshot.clone(),
            origin: PatchOrigin::Local,
        };
        ctx.state.patch_hub.emit(&batch);
        ctx.state.change_hub.emit(&ChangeEvent::Mutation {
            patches: commit.patches.clone(),
        });
    }

    fn subscribe(&mut self) -> bool {
        self.active = true;
        true
    }

    fn unsubscribe(&mut self) {
        self.active = false;
    }
}
