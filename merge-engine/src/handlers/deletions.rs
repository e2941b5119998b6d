//! Deletion handling. Always on, always last.
//!
//! Two jobs. First, a sweep guaranteeing that every base node deleted on
//! both sides is really gone from the merged tree. Second, arbitration for
//! inner types deleted on one side only: superimposition keeps the shell so
//! the other side's edits are not lost silently — if nothing survived in it,
//! the shell is dropped; if edits survived, the shell becomes a
//! delete-vs-edit conflict carrying the surviving body. Terminal-level
//! deletions need no work here: their tagged bodies already merged into
//! either a clean removal or a delete-vs-edit conflict.

use tracing::warn;

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::{format_conflict, has_conflict_markers};
use crate::printer::print_subtree;
use crate::tree::{MergingMechanism, NodeId};

use super::{ConflictHandler, Side};

pub struct DeletionsHandler;

impl ConflictHandler for DeletionsHandler {
    fn name(&self) -> &'static str {
        "deletions"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        let root = ctx.superimposed_tree;
        for id in ctx.deleted_base_nodes.clone() {
            if ctx.arena.is_attached_under(id, root) {
                warn!("lone base node survived superimposition; detaching");
                ctx.arena.detach(id);
            }
        }
        resolve_one_sided_deletions(ctx, cfg, Side::Left);
        resolve_one_sided_deletions(ctx, cfg, Side::Right);
        Ok(())
    }
}

fn resolve_one_sided_deletions(ctx: &mut MergeContext, cfg: &MergeConfig, side: Side) {
    let root = ctx.superimposed_tree;
    let deleted: Vec<NodeId> = match side {
        Side::Left => ctx.nodes_deleted_by_left.clone(),
        Side::Right => ctx.nodes_deleted_by_right.clone(),
    };

    for id in deleted {
        if ctx.deleted_base_nodes.contains(&id)
            || ctx.arena.is_terminal(id)
            || !ctx.arena.is_attached_under(id, root)
        {
            continue;
        }
        let terminals = ctx.arena.descendant_terminals(id);
        if terminals
            .iter()
            .any(|&t| has_conflict_markers(ctx.arena.body(t)))
        {
            // Member-level conflicts already surface the disagreement; the
            // shell stays, but its header may have merged away with the
            // deleting side and must come back for the class to print.
            restore_header_if_blank(ctx, id);
            continue;
        }
        let all_blank = terminals.iter().all(|&t| {
            ctx.arena.body(t).trim().is_empty() && ctx.arena.prefix(t).trim().is_empty()
        });
        if all_blank {
            // The other side left the element unchanged: accept the deletion.
            ctx.arena.detach(id);
            continue;
        }

        // The other side kept content inside the deleted element: surface a
        // delete-vs-edit conflict carrying the surviving body.
        let surviving = print_subtree(&ctx.arena, id);
        let (left, right) = match side {
            Side::Left => (String::new(), surviving),
            Side::Right => (surviving, String::new()),
        };
        let conflict = format_conflict(&left, "", &right, cfg.show_base);

        let (node_type, name, parent) = {
            let n = ctx.arena.node(id);
            (n.node_type.clone(), n.name.clone(), n.parent)
        };
        let Some(parent) = parent else { continue };
        let position = ctx.arena.child_index(parent, id).unwrap_or(0);
        ctx.arena.detach(id);
        let replacement = ctx.arena.new_terminal(
            node_type,
            name,
            conflict,
            "",
            MergingMechanism::ConflictMerge,
        );
        ctx.arena.insert_child(parent, position, replacement);
    }
}

/// Brings back the base header of a shell whose header body merged to
/// nothing because the deleting side contributed the empty string.
fn restore_header_if_blank(ctx: &mut MergeContext, shell: NodeId) {
    let Some(header) = ctx
        .arena
        .children(shell)
        .iter()
        .copied()
        .find(|&c| ctx.arena.node(c).node_type == "TypeHeader")
    else {
        return;
    };
    if !ctx.arena.body(header).trim().is_empty() {
        return;
    }
    let wanted = (
        ctx.arena.node(shell).node_type.clone(),
        ctx.arena.node(shell).name.clone(),
    );
    let mut stack = vec![ctx.base_tree];
    while let Some(id) = stack.pop() {
        let node = ctx.arena.node(id);
        if !node.is_terminal() {
            if node.node_type == wanted.0 && node.name == wanted.1 {
                if let Some(&base_header) = ctx
                    .arena
                    .children(id)
                    .iter()
                    .find(|&&c| ctx.arena.node(c).node_type == "TypeHeader")
                {
                    let body = ctx.arena.body(base_header).to_string();
                    ctx.arena.set_body(header, body);
                }
                return;
            }
            stack.extend(ctx.arena.children(id).iter().copied());
        }
    }
}
