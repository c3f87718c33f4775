//! Break insertion at block edges.
//!
//! A split in the middle of a block is a genuine split and passes through
//! untouched. A split at the very start or very end of a block is rewritten
//! into inserting a fresh empty block instead, which avoids churning the
//! existing block's children. The replacement operations re-enter the chain,
//! so the block ceiling still applies to them.

use crate::operation::{Node, NodePosition, Operation, TextPoint};
use crate::plugin::{ApplyDecision, BehaviorPlugin, PluginCtx};
use crate::plugins::utils;
use crate::surface::EditingSurface;
use stanza_types::{Selection, SelectionPoint};

#[derive(Debug, Default)]
pub struct InsertBreakPlugin;

impl<S: EditingSurface> BehaviorPlugin<S> for InsertBreakPlugin {
    fn name(&self) -> &'static str {
        "insert-break"
    }

    fn intercept_apply(&mut self, op: &mut Operation, ctx: &mut PluginCtx<'_, S>) -> ApplyDecision {
        let Operation::SplitNode { at, .. } = op else {
            return ApplyDecision::Continue;
        };
        let at = *at;
        let Some(text) = ctx
            .surface
            .value()
            .blocks
            .get(at.block)
            .and_then(|b| b.as_text())
        else {
            return ApplyDecision::Continue;
        };

        if at_block_start(at) {
            let block = utils::empty_text_block(
                &ctx.state.schema,
                ctx.state.next_key(),
                ctx.state.next_key(),
            );
            // Caret stays in the original block, which shifts down by one.
            return ApplyDecision::Replace(vec![Operation::InsertNode {
                at: NodePosition::block(at.block),
                node: Node::Block(block),
            }]);
        }

        if at_block_end(at, text) {
            let block_key = ctx.state.next_key();
            let child_key = ctx.state.next_key();
            let block =
                utils::empty_text_block(&ctx.state.schema, block_key.clone(), child_key.clone());
            let caret = SelectionPoint {
                block_key,
                child_key,
                offset: 0,
            };
            return ApplyDecision::Replace(vec![
                Operation::InsertNode {
                    at: NodePosition::block(at.block + 1),
                    node: Node::Block(block),
                },
                Operation::SetSelection {
                    selection: Some(Selection::collapsed(caret)),
                },
            ]);
        }

        ApplyDecision::Continue
    }
}

fn at_block_start(at: TextPoint) -> bool {
    at.child == 0 && at.offset == 0
}

fn at_block_end(at: TextPoint, text: &stanza_types::TextBlock) -> bool {
    if at.child + 1 != text.children.len() {
        return false;
    }
    text.children[at.child]
        .as_span()
        .is_some_and(|span| at.offset == span.len_chars())
}
