//! The composed editor.
//!
//! `Editor` wires a surface, the shared state and the plugin chain into one
//! processing pipeline. Every edit goes through a pass:
//!
//! 1. interception: each plugin may rewrite, veto or replace the operation,
//! 2. translation: the surviving operation becomes patches against the
//!    pre-operation document,
//! 3. application: the surface applies the operation mechanically,
//! 4. normalization: plugins propose repair operations until none are left,
//! 5. commit: the settled pass is handed to every plugin (history recording,
//!    patch publication, selection events).
//!
//! Install and destroy bracket the editor's life. Destroying twice is an
//! error; after destroy the surface applies operations unwrapped.

use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use stanza_patch::{Patch, PatchBatch, Path, apply_all, invert_batch};
use stanza_types::{Document, Selection};

use crate::composer::{EditorOptions, compose};
use crate::error::EditorError;
use crate::history::History;
use crate::operation::{Node, NodePosition, Operation};
use crate::plugin::{ApplyDecision, BehaviorPlugin, CommitRecord, EditorState, PassKind, PluginCtx};
use crate::plugins::utils;
use crate::stream::{ChangeEvent, ListenerId};
use crate::surface::EditingSurface;
use crate::translate::translate;

/// Cap on normalization rounds per pass. Repair operations can themselves
/// violate other plugins' invariants, so rounds repeat until quiescent; a
/// cycle between two plugins would otherwise spin forever.
const MAX_NORMALIZE_ROUNDS: usize = 16;

/// Marker that an install completed and has not been torn down.
#[derive(Debug, Default)]
struct PristineState;

/// Handle for the plugin subscriptions started by [`Editor::subscribe`].
#[derive(Debug)]
pub struct SubscriptionSet {
    indices: Vec<usize>,
}

/// A portable-text editing core bound to a surface.
pub struct Editor<S: EditingSurface> {
    surface: S,
    state: EditorState,
    plugins: Vec<Box<dyn BehaviorPlugin<S>>>,
    pristine: Option<PristineState>,
}

impl<S: EditingSurface> Editor<S> {
    /// Install the editing core on a surface.
    ///
    /// The initial document is normalized immediately (keys assigned, styles
    /// defaulted, empty document given a placeholder block); those repairs
    /// are not undoable and are not published.
    pub fn new(surface: S, options: EditorOptions) -> Result<Self, EditorError> {
        let EditorOptions {
            schema,
            key_generator,
            read_only,
            max_blocks,
            undo_depth,
        } = options;
        let mut editor = Self {
            surface,
            state: EditorState {
                schema,
                keys: key_generator,
                max_blocks,
                read_only,
                history: History::new(undo_depth),
                patch_hub: Default::default(),
                change_hub: Default::default(),
            },
            plugins: compose(read_only),
            pristine: Some(PristineState),
        };
        editor.run_pass(Vec::new(), PassKind::Historic)?;
        let snapshot = editor.surface.value().clone();
        editor.state.change_hub.emit(&ChangeEvent::Value { snapshot });
        Ok(editor)
    }

    pub fn value(&self) -> &Document {
        self.surface.value()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.surface.selection()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    /// Register a listener for committed patch batches.
    pub fn on_patch<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PatchBatch) + 'static,
    {
        self.state.patch_hub.on(listener)
    }

    pub fn off_patch(&mut self, id: ListenerId) -> bool {
        self.state.patch_hub.off(id)
    }

    /// Register a listener for change events.
    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.state.change_hub.on(listener)
    }

    pub fn off_change(&mut self, id: ListenerId) -> bool {
        self.state.change_hub.off(id)
    }

    /// Start every plugin's internal subscription.
    pub fn subscribe(&mut self) -> SubscriptionSet {
        let mut indices = Vec::new();
        for (i, plugin) in self.plugins.iter_mut().enumerate() {
            if plugin.subscribe() {
                indices.push(i);
            }
        }
        SubscriptionSet { indices }
    }

    /// Tear down the subscriptions in a set, each exactly once.
    pub fn unsubscribe(&mut self, set: SubscriptionSet) {
        for i in set.indices {
            if let Some(plugin) = self.plugins.get_mut(i) {
                plugin.unsubscribe();
            }
        }
    }

    /// Run one operation through the pipeline.
    ///
    /// Returns `Ok(false)` when the operation was vetoed (or dropped by
    /// read-only mode) and the document is unchanged.
    pub fn apply(&mut self, op: Operation) -> Result<bool, EditorError> {
        if self.pristine.is_none() {
            // Destroyed editors pass operations straight through.
            self.surface.apply(&op)?;
            return Ok(true);
        }
        if self.state.read_only && !op.is_selection_only() {
            debug!("dropping mutation in read-only mode");
            return Ok(false);
        }
        self.run_pass(vec![op], PassKind::Local)
    }

    /// Undo the most recent local change. Returns whether anything happened.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        if self.pristine.is_none() || self.state.read_only {
            return Ok(false);
        }
        let Some(entry) = self.state.history.pop_undo() else {
            return Ok(false);
        };
        let selection_before = self.surface.selection().cloned();
        if let Err(err) = apply_all(self.surface.value_mut(), &entry.inverse) {
            self.state.history.restore_undo(entry);
            return Err(err.into());
        }
        self.surface.set_selection(entry.selection_before.clone());
        self.commit_historic(entry.inverse.clone(), entry.patches.clone(), selection_before);
        self.state.history.stash_redo(entry);
        Ok(true)
    }

    /// Re-apply the most recently undone change.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        if self.pristine.is_none() || self.state.read_only {
            return Ok(false);
        }
        let Some(entry) = self.state.history.pop_redo() else {
            return Ok(false);
        };
        let selection_before = self.surface.selection().cloned();
        if let Err(err) = apply_all(self.surface.value_mut(), &entry.patches) {
            self.state.history.stash_redo(entry);
            return Err(err.into());
        }
        self.surface.set_selection(entry.selection_after.clone());
        self.commit_historic(entry.patches.clone(), entry.inverse.clone(), selection_before);
        self.state.history.restore_undo(entry);
        Ok(true)
    }

    /// Tear the editing core down, leaving the surface bare.
    ///
    /// Fails if the editor was already destroyed.
    pub fn destroy(&mut self) -> Result<(), EditorError> {
        self.pristine.take().ok_or(EditorError::MissingPristineState)?;
        for plugin in &mut self.plugins {
            plugin.unsubscribe();
        }
        self.state.history.clear();
        Ok(())
    }

    /// Destroy (if installed) and install again with new options.
    ///
    /// Hub listeners survive a reinstall; history does not.
    pub fn reinstall(&mut self, options: EditorOptions) -> Result<(), EditorError> {
        if self.pristine.is_some() {
            self.destroy()?;
        }
        let EditorOptions {
            schema,
            key_generator,
            read_only,
            max_blocks,
            undo_depth,
        } = options;
        self.state.schema = schema;
        self.state.keys = key_generator;
        self.state.max_blocks = max_blocks;
        self.state.read_only = read_only;
        self.state.history = History::new(undo_depth);
        self.plugins = compose(read_only);
        self.pristine = Some(PristineState);
        self.run_pass(Vec::new(), PassKind::Historic)?;
        let snapshot = self.surface.value().clone();
        self.state.change_hub.emit(&ChangeEvent::Value { snapshot });
        Ok(())
    }

    /// Insert a block after the focused block (or at the end), returning the
    /// path of the new block, or `None` if the insert was vetoed.
    pub fn insert_block(
        &mut self,
        type_name: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<Path>, EditorError> {
        if self.pristine.is_none() {
            return Ok(None);
        }
        let key = self.state.next_key();
        let node = if self.state.schema.is_block_type(type_name) {
            let child_key = self.state.next_key();
            utils::empty_text_block(&self.state.schema, key.clone(), child_key)
        } else {
            utils::object_block(key.clone(), type_name.into(), fields)
        };
        let index = self
            .focused_block_index()
            .map_or(self.surface.value().len(), |i| i + 1);
        let applied = self.apply(Operation::InsertNode {
            at: NodePosition::block(index),
            node: Node::Block(node),
        })?;
        Ok(applied.then(|| Path::block(key)))
    }

    /// Insert a child into the focused text block (or the last one),
    /// returning the path of the new child, or `None` if vetoed.
    pub fn insert_child(
        &mut self,
        type_name: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<Path>, EditorError> {
        if self.pristine.is_none() {
            return Ok(None);
        }
        let doc = self.surface.value();
        let block_index = match self.focused_block_index() {
            Some(i) => i,
            None if !doc.is_empty() => doc.len() - 1,
            None => {
                return Err(EditorError::InvalidOperation(
                    "no block to insert a child into".into(),
                ));
            }
        };
        let block = &doc.blocks[block_index];
        let Some(text) = block.as_text() else {
            return Err(EditorError::InvalidOperation(
                "target block cannot hold children".into(),
            ));
        };
        let block_key = text.key.clone();
        let child_index = self
            .focused_child_index(text)
            .map_or(text.children.len(), |i| i + 1);

        let key = self.state.next_key();
        let node = if self.state.schema.is_span_type(type_name) {
            let text = fields
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            utils::span(&self.state.schema, key.clone(), text, Vec::new())
        } else {
            utils::inline_object(key.clone(), type_name.into(), fields)
        };
        let applied = self.apply(Operation::InsertNode {
            at: NodePosition::child(block_index, child_index),
            node: Node::Child(node),
        })?;
        Ok(applied.then(|| Path::block(block_key).child(key)))
    }

    /// Merge late-arriving properties into the block with the given key.
    ///
    /// Used by hosts that render a placeholder while the real content of an
    /// embedded object resolves asynchronously; the update goes through the
    /// normal pipeline and is published as its own batch.
    pub fn resolve_initial_value(
        &mut self,
        key: &str,
        props: Map<String, Value>,
    ) -> Result<bool, EditorError> {
        let index = self
            .surface
            .value()
            .index_of(key)
            .ok_or_else(|| EditorError::NodeNotFound(key.into()))?;
        self.apply(Operation::SetNode {
            at: NodePosition::block(index),
            props,
        })
    }

    fn focused_block_index(&self) -> Option<usize> {
        let selection = self.surface.selection()?;
        self.surface.value().index_of(&selection.focus.block_key)
    }

    fn focused_child_index(&self, text: &stanza_types::TextBlock) -> Option<usize> {
        let selection = self.surface.selection()?;
        text.index_of_child(&selection.focus.child_key)
    }

    /// Run a full pass: pipeline for each operation, then normalization
    /// rounds, then commit.
    fn run_pass(&mut self, ops: Vec<Operation>, kind: PassKind) -> Result<bool, EditorError> {
        let Self {
            surface,
            state,
            plugins,
            ..
        } = self;
        let selection_before = surface.selection().cloned();
        let mut patches = Vec::new();
        let mut inverse = Vec::new();
        let mut applied = false;

        for op in ops {
            applied |= process_op(surface, state, plugins, op, &mut patches, &mut inverse)?;
        }

        for round in 0..MAX_NORMALIZE_ROUNDS {
            let mut repairs = Vec::new();
            {
                let mut ctx = PluginCtx { surface: &mut *surface, state: &mut *state };
                for plugin in plugins.iter_mut() {
                    repairs.extend(plugin.normalize(&mut ctx));
                }
            }
            if repairs.is_empty() {
                break;
            }
            if round + 1 == MAX_NORMALIZE_ROUNDS {
                warn!(round, "normalization did not settle; giving up");
                break;
            }
            for repair in repairs {
                // A failed repair is dropped rather than failing the pass.
                match process_op(surface, state, plugins, repair, &mut patches, &mut inverse) {
                    Ok(did) => applied |= did,
                    Err(err) => warn!(%err, "skipping failed repair operation"),
                }
            }
        }

        let commit = CommitRecord {
            kind,
            patches,
            inverse,
            snapshot: surface.value().clone(),
            selection_before,
            selection_after: surface.selection().cloned(),
        };
        let mut ctx = PluginCtx { surface: &mut *surface, state: &mut *state };
        for plugin in plugins.iter_mut() {
            plugin.on_commit(&commit, &mut ctx);
        }
        Ok(applied)
    }

    /// Commit hooks and value event for an undo/redo replay.
    fn commit_historic(
        &mut self,
        patches: Vec<Patch>,
        inverse: Vec<Patch>,
        selection_before: Option<Selection>,
    ) {
        let Self {
            surface,
            state,
            plugins,
            ..
        } = self;
        let commit = CommitRecord {
            kind: PassKind::Historic,
            patches,
            inverse,
            snapshot: surface.value().clone(),
            selection_before,
            selection_after: surface.selection().cloned(),
        };
        let mut ctx = PluginCtx { surface: &mut *surface, state: &mut *state };
        for plugin in plugins.iter_mut() {
            plugin.on_commit(&commit, &mut ctx);
        }
        let snapshot = surface.value().clone();
        state.change_hub.emit(&ChangeEvent::Value { snapshot });
    }
}

impl<S: EditingSurface> std::fmt::Debug for Editor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("installed", &self.pristine.is_some())
            .field("plugins", &self.plugins.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Run one operation (and any replacements it expands into) through
/// interception, translation and application.
fn process_op<S: EditingSurface>(
    surface: &mut S,
    state: &mut EditorState,
    plugins: &mut [Box<dyn BehaviorPlugin<S>>],
    op: Operation,
    patches: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) -> Result<bool, EditorError> {
    let mut queue = VecDeque::from([op]);
    let mut applied = false;

    'ops: while let Some(mut op) = queue.pop_front() {
        {
            let mut ctx = PluginCtx { surface: &mut *surface, state: &mut *state };
            for plugin in plugins.iter_mut() {
                match plugin.intercept_apply(&mut op, &mut ctx) {
                    ApplyDecision::Continue => {}
                    ApplyDecision::Veto => continue 'ops,
                    ApplyDecision::Replace(replacements) => {
                        // Replacements re-enter the chain from the top, in order.
                        for repl in replacements.into_iter().rev() {
                            queue.push_front(repl);
                        }
                        continue 'ops;
                    }
                }
            }
        }

        let before = surface.value().clone();
        let op_patches = translate(&op, &before, &state.schema)?;
        surface.apply(&op)?;
        applied = true;
        if !op_patches.is_empty() {
            let op_inverse = invert_batch(&op_patches, &before)?;
            // Later operations are undone first.
            inverse.splice(0..0, op_inverse);
            patches.extend(op_patches);
        }
    }
    Ok(applied)
}
