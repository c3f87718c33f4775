//! The behavior-plugin interface.
//!
//! Plugins are capability units folded into an ordered chain by the
//! composer. Each one can intercept operations before they apply, propose
//! repair operations during normalization, and react to committed passes.
//! Shared mutable state (schema, key generator, history, hubs) lives in
//! `EditorState`, handed to every hook through `PluginCtx`.

use smol_str::SmolStr;
use stanza_patch::Patch;
use stanza_types::{Document, KeyGenerator, SchemaTypes, Selection};

use crate::history::History;
use crate::operation::Operation;
use crate::stream::{ChangeHub, PatchHub};
use crate::surface::EditingSurface;

/// Result of an `intercept_apply` hook.
#[derive(Debug)]
pub enum ApplyDecision {
    /// Pass the (possibly modified) operation on to the next plugin.
    Continue,
    /// Drop the operation entirely; the pass treats it as a no-op.
    Veto,
    /// Substitute other operations. They re-enter the chain from the top.
    Replace(Vec<Operation>),
}

/// What kind of pass produced a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    /// A regular local edit.
    Local,
    /// An undo or redo replay; not recorded in history again.
    Historic,
}

/// The outcome of one settled processing pass.
#[derive(Clone, Debug)]
pub struct CommitRecord {
    pub kind: PassKind,
    /// Patches in emission order.
    pub patches: Vec<Patch>,
    /// Patches undoing this pass, in application order.
    pub inverse: Vec<Patch>,
    /// Document after the pass.
    pub snapshot: Document,
    pub selection_before: Option<Selection>,
    pub selection_after: Option<Selection>,
}

impl CommitRecord {
    /// Whether the pass changed only the selection.
    pub fn is_selection_only(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Shared state owned by the editor and visible to every plugin.
pub struct EditorState {
    pub schema: SchemaTypes,
    pub keys: Box<dyn KeyGenerator>,
    /// Maximum number of blocks; `None` means unlimited.
    pub max_blocks: Option<usize>,
    pub read_only: bool,
    pub history: History,
    pub patch_hub: PatchHub,
    pub change_hub: ChangeHub,
}

impl EditorState {
    /// Fresh key from the configured generator.
    pub fn next_key(&self) -> SmolStr {
        self.keys.next_key()
    }
}

impl std::fmt::Debug for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorState")
            .field("max_blocks", &self.max_blocks)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

/// Borrowed view of the surface and shared state during a hook.
pub struct PluginCtx<'a, S: EditingSurface> {
    pub surface: &'a mut S,
    pub state: &'a mut EditorState,
}

impl<'a, S: EditingSurface> PluginCtx<'a, S> {
    pub fn doc(&self) -> &Document {
        self.surface.value()
    }
}

/// One link of the plugin chain.
///
/// All hooks are optional; the default implementations do nothing.
pub trait BehaviorPlugin<S: EditingSurface> {
    fn name(&self) -> &'static str;

    /// Inspect or rewrite an operation before it is translated and applied.
    fn intercept_apply(
        &mut self,
        _op: &mut Operation,
        _ctx: &mut PluginCtx<'_, S>,
    ) -> ApplyDecision {
        ApplyDecision::Continue
    }

    /// Propose repair operations for structural invariant violations.
    /// Called repeatedly until every plugin returns an empty list.
    fn normalize(&mut self, _ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        Vec::new()
    }

    /// React to a settled pass (publish, record history, emit events).
    fn on_commit(&mut self, _commit: &CommitRecord, _ctx: &mut PluginCtx<'_, S>) {}

    /// Start this plugin's internal subscription. Returns whether one was
    /// started; the composer pairs it with exactly one `unsubscribe`.
    fn subscribe(&mut self) -> bool {
        false
    }

    /// Tear down the subscription started by `subscribe`.
    fn unsubscribe(&mut self) {}
}
