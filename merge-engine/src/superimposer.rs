//! Pairwise tree superimposition.
//!
//! Superimposition merges two trees recursively from the root, matching
//! children by `(type, name)`. Running it twice — left over base, then that
//! result over right — yields a combined tree in which every matched leaf
//! body carries the three contributions spliced together with internal
//! sentinels, ready for the content merger to split.
//!
//! Pass one (`Step::LeftBase`) tags a matched leaf as
//! `MARKER left SEP base SEP`; pass two (`Step::LeftBaseRight`) appends the
//! right contribution, or fabricates the missing slots for leaves only one
//! pass has seen. The net effect is that every tagged body has the exact
//! shape `MARKER left SEP base SEP right`, some parts possibly empty.

use tracing::warn;

use crate::context::MergeContext;
use crate::matcher::{compatible, find_child_like, get_compatible_child};
use crate::tree::{MergingMechanism, NodeId, Origin};

/// Sentinel opening a contribution-tagged body. Never appears in legal
/// source text.
pub const SEMANTIC_MARKER: &str = "~~ssmerge~~";
/// Sentinel separating the left/base/right contributions of a tagged body.
pub const SEPARATOR: &str = "##ssmerge##";

/// Which of the two superimposition passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LeftBase,
    LeftBaseRight,
}

/// Superimposes `a` over `b`, producing a combined node under `parent`.
/// Returns `None` when the two nodes are not compatible (or not of the same
/// kind), in which case nothing is produced.
pub(crate) fn superimpose(
    ctx: &mut MergeContext,
    a: NodeId,
    b: NodeId,
    parent: Option<NodeId>,
    step: Step,
) -> Option<NodeId> {
    if !compatible(&ctx.arena, a, b) {
        return None;
    }

    // The combined node starts as a's shell and carries b's origin, encoding
    // the provenance of the match.
    let origin_b = ctx.arena.node(b).origin;
    let result = ctx.arena.shallow_clone(a);
    let shell = ctx.arena.node_mut(result);
    shell.origin = origin_b;
    shell.parent = parent;

    match (ctx.arena.is_terminal(a), ctx.arena.is_terminal(b)) {
        (true, true) => {
            superimpose_terminals(ctx, a, b, step, result);
            Some(result)
        }
        (false, false) => {
            superimpose_children_of_b(ctx, a, b, step, result);
            superimpose_children_of_a(ctx, a, b, step, result);
            Some(result)
        }
        _ => {
            warn!(
                node_type = %ctx.arena.node(a).node_type,
                name = %ctx.arena.node(a).name,
                "nodes agree on identity but not on kind; skipping"
            );
            None
        }
    }
}

fn superimpose_terminals(ctx: &mut MergeContext, a: NodeId, b: NodeId, step: Step, result: NodeId) {
    if ctx.arena.mechanism(a) == MergingMechanism::Default {
        // Identity-matched leaf: a's body survives untouched.
        return;
    }
    let origin_a = ctx.arena.node(a).origin;
    let body = mark_contributions(ctx.arena.body(a), ctx.arena.body(b), step, origin_a);
    let prefix = mark_contributions(ctx.arena.prefix(a), ctx.arena.prefix(b), step, origin_a);
    ctx.arena.set_body(result, body);
    ctx.arena.set_prefix(result, prefix);
}

/// Splices two contributions into one tagged body.
///
/// The second pass relies on the first pass stamping the base origin on every
/// matched node: the only `Origin::Left` leaves it can encounter are clones
/// added by left, whose base slot must stay empty.
fn mark_contributions(body_a: &str, body_b: &str, step: Step, origin_a: Option<Origin>) -> String {
    if body_a.contains(SEMANTIC_MARKER) {
        return format!("{body_a}{body_b}");
    }
    match step {
        Step::LeftBase => {
            format!("{SEMANTIC_MARKER}{body_a}{SEPARATOR}{body_b}{SEPARATOR}")
        }
        Step::LeftBaseRight => {
            if origin_a == Some(Origin::Left) {
                format!("{SEMANTIC_MARKER}{body_a}{SEPARATOR}{SEPARATOR}{body_b}")
            } else {
                format!("{SEMANTIC_MARKER}{SEPARATOR}{body_a}{SEPARATOR}{body_b}")
            }
        }
    }
}

/// Phase α: walks b's children. Matched children recurse; unmatched ones are
/// base nodes deleted by left (first pass) or nodes added by right (second
/// pass) and are carried over as deep clones.
fn superimpose_children_of_b(
    ctx: &mut MergeContext,
    a: NodeId,
    b: NodeId,
    step: Step,
    result: NodeId,
) {
    let b_children = ctx.arena.children(b).to_vec();
    for child_b in b_children {
        match get_compatible_child(&ctx.arena, a, child_b) {
            None => {
                let clone_b = clone_into_tree(ctx, b, child_b);
                ctx.arena.add_child(result, clone_b);
                match step {
                    Step::LeftBase => ctx.nodes_deleted_by_left.push(clone_b),
                    Step::LeftBaseRight => ctx.added_right_nodes.push(clone_b),
                }
            }
            Some(child_a) => {
                inherit_origin(ctx, a, child_a);
                inherit_origin(ctx, b, child_b);

                // A node added by left that right also added: remember the
                // match for the duplicated-declaration handler.
                let duplicated_addition = step == Step::LeftBaseRight
                    && ctx.added_left_nodes.contains(&child_a);

                if let Some(merged) = superimpose(ctx, child_a, child_b, Some(result), step) {
                    ctx.arena.add_child(result, merged);
                    if step == Step::LeftBaseRight {
                        ctx.re_point(child_a, merged);
                        if duplicated_addition {
                            ctx.added_right_nodes.push(merged);
                        }
                    }
                }
            }
        }
    }
}

/// Phase β: walks a's children with no counterpart in b — nodes added by
/// left (first pass) or deleted by right (second pass). Each is cloned and
/// placed next to its original neighbour in the combined child list.
fn superimpose_children_of_a(
    ctx: &mut MergeContext,
    a: NodeId,
    b: NodeId,
    step: Step,
    result: NodeId,
) {
    let a_children = ctx.arena.children(a).to_vec();
    for (i, &child_a) in a_children.iter().enumerate() {
        if get_compatible_child(&ctx.arena, b, child_a).is_some() {
            continue;
        }

        let clone_a = clone_into_tree(ctx, a, child_a);
        let left_neighbour = if i > 0 { Some(a_children[i - 1]) } else { None };
        let right_neighbour = a_children.get(i + 1).copied();
        add_node_near_neighbour(ctx, result, clone_a, left_neighbour, right_neighbour);

        match step {
            Step::LeftBase => ctx.added_left_nodes.push(clone_a),
            Step::LeftBaseRight => {
                if let Some(pos) = ctx.added_left_nodes.iter().position(|&n| n == child_a) {
                    // A left addition carried into the final tree.
                    ctx.added_left_nodes[pos] = clone_a;
                } else {
                    ctx.nodes_deleted_by_right.push(clone_a);
                    if let Some(pos) =
                        ctx.nodes_deleted_by_left.iter().position(|&n| n == child_a)
                    {
                        // Deleted on both sides: a lone base node to be
                        // removed before serialization.
                        ctx.nodes_deleted_by_left[pos] = clone_a;
                        ctx.deleted_base_nodes.push(clone_a);
                    }
                }
            }
        }
    }
}

/// Deep-clones `child` for insertion into the combined tree, stamping the
/// (possibly inherited) origin on the whole cloned subtree.
fn clone_into_tree(ctx: &mut MergeContext, parent_in_tree: NodeId, child: NodeId) -> NodeId {
    inherit_origin(ctx, parent_in_tree, child);
    let clone = ctx.arena.deep_clone(child);
    if let Some(origin) = ctx.arena.node(child).origin {
        ctx.arena.set_origin_recursive(clone, origin);
    }
    clone
}

fn inherit_origin(ctx: &mut MergeContext, parent: NodeId, child: NodeId) {
    if ctx.arena.node(child).origin.is_none() {
        let origin = ctx.arena.node(parent).origin;
        ctx.arena.node_mut(child).origin = origin;
    }
}

/// Inserts `node` into `parent` right after the counterpart of its original
/// left neighbour, else right before the counterpart of its right neighbour,
/// else at the end.
fn add_node_near_neighbour(
    ctx: &mut MergeContext,
    parent: NodeId,
    node: NodeId,
    left_neighbour: Option<NodeId>,
    right_neighbour: Option<NodeId>,
) {
    if let Some(neighbour) = left_neighbour {
        if let Some(index) = find_child_like(&ctx.arena, parent, neighbour) {
            ctx.arena.insert_child(parent, index + 1, node);
            return;
        }
    }
    if let Some(neighbour) = right_neighbour {
        if let Some(index) = find_child_like(&ctx.arena, parent, neighbour) {
            ctx.arena.insert_child(parent, index, node);
            return;
        }
    }
    ctx.arena.add_child(parent, node);
}

/// Detaches every lone base node (deleted on both sides) that survived the
/// two passes. Identity is the arena id of the exact clone phase α inserted,
/// never structural equality — two deleted base children may well be
/// structurally identical.
pub(crate) fn remove_remaining_base_nodes(ctx: &mut MergeContext, merged_tree: NodeId) {
    if ctx.deleted_base_nodes.is_empty() {
        return;
    }
    if ctx.deleted_base_nodes.contains(&merged_tree) {
        ctx.arena.detach(merged_tree);
        return;
    }
    let children = ctx.arena.children(merged_tree).to_vec();
    for child in children {
        remove_remaining_base_nodes(ctx, child);
    }
}
