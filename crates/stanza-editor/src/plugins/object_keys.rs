//! Key assignment and repair.
//!
//! Every block and child must carry a unique `_key`; patches address nodes
//! by key, so a keyless node is unreachable. Keys are
//! assigned eagerly in `intercept_apply` for inserts and splits, and any
//! keyless or duplicate-keyed node found during normalization gets a key
//! repair. Block repairs are ordered before child repairs so a child path
//! always has an addressable parent.

use std::collections::HashSet;

use serde_json::{Map, Value};
use smol_str::SmolStr;
use tracing::debug;

use crate::operation::{NodePosition, Operation};
use crate::plugin::{ApplyDecision, BehaviorPlugin, PluginCtx};
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct ObjectKeysPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for ObjectKeysPlugin {
    fn name(&self) -> &'static str {
        "object-keys"
    }

    fn intercept_apply(&mut self, op: &mut Operation, ctx: &mut PluginCtx<'_, S>) -> ApplyDecision {
        match op {
            Operation::InsertNode { node, .. } => {
                node.assign_missing_keys(ctx.state.keys.as_ref());
            }
            Operation::SplitNode {
                new_block_key,
                new_child_key,
                ..
            } => {
                if new_block_key.as_deref().unwrap_or("").is_empty() {
                    *new_block_key = Some(ctx.state.next_key());
                }
                if new_child_key.as_deref().unwrap_or("").is_empty() {
                    *new_child_key = Some(ctx.state.next_key());
                }
            }
            _ => {}
        }
        ApplyDecision::Continue
    }

    fn normalize(&mut self, ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        let mut repairs = Vec::new();
        let mut block_seen: HashSet<SmolStr> = HashSet::new();
        let mut child_repairs = Vec::new();

        for (b, block) in ctx.surface.value().blocks.iter().enumerate() {
            if block.key().is_empty() || !block_seen.insert(block.key().clone()) {
                repairs.push(key_repair(NodePosition::block(b), ctx.state.next_key()));
            }
            let Some(text) = block.as_text() else { continue };
            // Child keys are scoped to their block; the same key in two
            // different blocks is fine.
            let mut child_seen: HashSet<SmolStr> = HashSet::new();
            for (c, child) in text.children.iter().enumerate() {
                if child.key().is_empty() || !child_seen.insert(child.key().clone()) {
                    child_repairs.push(key_repair(NodePosition::child(b, c), ctx.state.next_key()));
                }
            }
        }
        repairs.extend(child_repairs);
        if !repairs.is_empty() {
            debug!(count = repairs.len(), "assigning missing keys");
        }
        repairs
    }
}

fn key_repair(at: NodePosition, key: SmolStr) -> Operation {
    let mut props = Map::new();
    props.insert("_key".into(), Value::String(key.to_string()));
    Operation::SetNode { at, props }
}
