//! Declarations added on both sides that collide in the language.
//!
//! Superimposition already folds additions with identical merge identities
//! into one node. What it cannot see is two sibling additions whose parser
//! identities differ while the *declared* identifier is the same — e.g.
//! `int k = 0;` against `int k = 1;`. Left as-is, the merged file declares
//! `k` twice. Identical normalized bodies collapse to one copy; differing
//! bodies become a conflict.

use tracing::warn;

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::{format_conflict, has_conflict_markers, normalized_single_line};
use crate::tree::NodeId;

use super::{declared_identifier, ConflictHandler};

pub struct DuplicatedDeclarationHandler;

impl ConflictHandler for DuplicatedDeclarationHandler {
    fn name(&self) -> &'static str {
        "duplicated-declaration"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        let root = ctx.superimposed_tree;
        let left_added: Vec<NodeId> = ctx.added_left_nodes.clone();
        let right_added: Vec<NodeId> = ctx.added_right_nodes.clone();

        for &left in &left_added {
            for &right in &right_added {
                if left == right
                    || !is_live_declaration(ctx, left, root)
                    || !is_live_declaration(ctx, right, root)
                    || ctx.arena.node(left).parent != ctx.arena.node(right).parent
                    || ctx.arena.node(left).node_type != ctx.arena.node(right).node_type
                {
                    continue;
                }
                let (Some(l_ident), Some(r_ident)) = (
                    declared_identifier(&ctx.arena, left),
                    declared_identifier(&ctx.arena, right),
                ) else {
                    continue;
                };
                if l_ident != r_ident {
                    continue;
                }

                let left_body = ctx.arena.body(left).to_string();
                let right_body = ctx.arena.body(right).to_string();
                if has_conflict_markers(&left_body) {
                    continue;
                }
                if normalized_single_line(&left_body) == normalized_single_line(&right_body) {
                    ctx.arena.detach(right);
                } else {
                    warn!(identifier = %l_ident, "both sides declare the same identifier");
                    ctx.arena.set_body(
                        left,
                        format_conflict(&left_body, "", &right_body, cfg.show_base),
                    );
                    ctx.arena.detach(right);
                }
            }
        }
        Ok(())
    }
}

fn is_live_declaration(ctx: &MergeContext, node: NodeId, root: NodeId) -> bool {
    ctx.arena.is_terminal(node) && ctx.arena.is_attached_under(node, root)
}
