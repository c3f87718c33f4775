//! Empty-document placeholder.
//!
//! The surface always needs at least one block to host a caret, so an empty
//! document is repaired with a single empty text block.

use crate::operation::{Node, NodePosition, Operation};
use crate::plugin::{BehaviorPlugin, PluginCtx};
use crate::plugins::utils;
use crate::surface::EditingSurface;

#[derive(Debug, Default)]
pub struct PlaceholderPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for PlaceholderPlugin {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn normalize(&mut self, ctx: &mut PluginCtx<'_, S>) -> Vec<Operation> {
        if !ctx.doc().is_empty() {
            return Vec::new();
        }
        let block = utils::empty_text_block(
            &ctx.state.schema,
            ctx.state.next_key(),
            ctx.state.next_key(),
        );
        vec![Operation::InsertNode {
            at: NodePosition::block(0),
            node: Node::Block(block),
        }]
    }
}
