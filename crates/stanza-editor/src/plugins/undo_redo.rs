//! History recording.
//!
//! Records every committed local, document-affecting pass as an invertible
//! history entry. Historic passes (undo/redo replays) are not re-recorded;
//! the editor moves their entries between the stacks itself.

use crate::history::HistoryEntry;
use crate::plugin::{BehaviorPlugin, CommitRecord, PassKind, PluginCtx};
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct UndoRedoPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for UndoRedoPlugin {
    fn name(&self) -> &'static str {
        "undo-redo"
    }

    fn on_commit(&mut self, commit: &CommitRecord, ctx: &mut PluginCtx<'_, S>) {
        if commit.kind != PassKind::Local || commit.is_selection_only() {
            return;
        }
        ctx.state.history.push(HistoryEntry {
            patches: commit.patches.clone(),
            inverse: commit.inverse.clone(),
            selection_before: commit.selection_before.clone(),
            selection_after: commit.selection_after.clone(),
        });
    }
}
