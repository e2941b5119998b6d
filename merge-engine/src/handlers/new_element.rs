//! New declarations referencing elements the other side changed.
//!
//! One side adds a method calling `m()`; the other side edits or deletes
//! `m`. The trees never overlap, so superimposition accepts both changes —
//! and the result may not compile, or may silently change behavior. The
//! handler flags the added declaration with a conflict citing the element it
//! references.

use tracing::warn;

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::{format_conflict, has_conflict_markers};
use crate::tree::NodeId;

use super::{declared_identifier, references_identifier, ConflictHandler, Side};

pub struct NewElementReferencingEditedOneHandler;

impl ConflictHandler for NewElementReferencingEditedOneHandler {
    fn name(&self) -> &'static str {
        "new-element-referencing-edited-one"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        process_side(ctx, cfg, Side::Left);
        process_side(ctx, cfg, Side::Right);
        Ok(())
    }
}

fn process_side(ctx: &mut MergeContext, cfg: &MergeConfig, side: Side) {
    let root = ctx.superimposed_tree;
    let added: Vec<NodeId> = match side {
        Side::Left => ctx.added_left_nodes.clone(),
        Side::Right => ctx.added_right_nodes.clone(),
    };
    // Elements the opposite side touched: edited in place or deleted.
    let changed: Vec<NodeId> = match side {
        Side::Left => ctx
            .edited_right_nodes
            .iter()
            .chain(ctx.nodes_deleted_by_right.iter())
            .copied()
            .collect(),
        Side::Right => ctx
            .edited_left_nodes
            .iter()
            .chain(ctx.nodes_deleted_by_left.iter())
            .copied()
            .collect(),
    };

    for added_node in added {
        if !ctx.arena.is_terminal(added_node)
            || !ctx.arena.is_attached_under(added_node, root)
            || has_conflict_markers(ctx.arena.body(added_node))
        {
            continue;
        }
        for &changed_node in &changed {
            if changed_node == added_node || !ctx.arena.is_terminal(changed_node) {
                continue;
            }
            let Some(identifier) = declared_identifier(&ctx.arena, changed_node) else {
                continue;
            };
            if !references_identifier(ctx.arena.body(added_node), &identifier) {
                continue;
            }

            warn!(
                identifier = %identifier,
                "new element references an element changed on the other side"
            );
            let added_body = ctx.arena.body(added_node).to_string();
            let changed_body = changed_body_for_citation(ctx, changed_node);
            let conflict = match side {
                Side::Left => format_conflict(&added_body, "", &changed_body, cfg.show_base),
                Side::Right => format_conflict(&changed_body, "", &added_body, cfg.show_base),
            };
            ctx.arena.set_body(added_node, conflict);
            break;
        }
    }
}

/// Content of the changed element as cited in the conflict: its merged body
/// when it survived, its base body when it was deleted.
fn changed_body_for_citation(ctx: &MergeContext, changed_node: NodeId) -> String {
    let current = ctx.arena.body(changed_node);
    if !current.trim().is_empty() && !has_conflict_markers(current) {
        return current.to_string();
    }
    find_base_body(ctx, changed_node).unwrap_or_default()
}

fn find_base_body(ctx: &MergeContext, reference: NodeId) -> Option<String> {
    let wanted = ctx.arena.node(reference);
    let mut stack = vec![ctx.base_tree];
    while let Some(id) = stack.pop() {
        let node = ctx.arena.node(id);
        if node.is_terminal() {
            if node.node_type == wanted.node_type && node.name == wanted.name {
                return Some(ctx.arena.body(id).to_string());
            }
        } else {
            stack.extend(ctx.arena.children(id).iter().copied());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::extract_merge_conflicts;
    use crate::tree::{MergingMechanism, NodeArena};

    fn method(arena: &mut NodeArena, name: &str, body: &str) -> NodeId {
        arena.new_terminal(
            "MethodDecl",
            name,
            body,
            "",
            MergingMechanism::ConflictMerge,
        )
    }

    /// Right adds `n()` calling `m`; left deleted `m`.
    fn deleted_reference_context() -> (MergeContext, NodeId) {
        let mut arena = NodeArena::new();
        let base_root = arena.new_non_terminal("CompilationUnit", "");
        let base_class = arena.new_non_terminal("ClassDecl", "A");
        arena.add_child(base_root, base_class);
        let base_m = method(&mut arena, "m()", "void m() { x(); }");
        arena.add_child(base_class, base_m);

        let root = arena.new_non_terminal("CompilationUnit", "");
        let class = arena.new_non_terminal("ClassDecl", "A");
        arena.add_child(root, class);
        let deleted_m = method(&mut arena, "m()", "");
        arena.add_child(class, deleted_m);
        let added_n = method(&mut arena, "n()", "void n() { m(); }");
        arena.add_child(class, added_n);

        let mut ctx = MergeContext::new(arena, root, base_root, root);
        ctx.superimposed_tree = root;
        ctx.added_right_nodes.push(added_n);
        ctx.nodes_deleted_by_left.push(deleted_m);
        (ctx, added_n)
    }

    #[test]
    fn added_node_referencing_deleted_one_conflicts() {
        let (mut ctx, added_n) = deleted_reference_context();
        NewElementReferencingEditedOneHandler
            .handle(&mut ctx, &MergeConfig::default())
            .unwrap();
        let conflicts = extract_merge_conflicts(ctx.arena.body(added_n));
        assert_eq!(conflicts.len(), 1);
        // Right added the element, so it sits on the YOURS side; the deleted
        // method's base body is cited on the MINE side.
        assert_eq!(conflicts[0].right, "void n() { m(); }");
        assert_eq!(conflicts[0].left, "void m() { x(); }");
    }

    #[test]
    fn added_node_referencing_edited_one_conflicts() {
        let mut arena = NodeArena::new();
        let root = arena.new_non_terminal("CompilationUnit", "");
        let class = arena.new_non_terminal("ClassDecl", "A");
        arena.add_child(root, class);
        let edited_m = method(&mut arena, "m()", "void m() { x(); y(); }");
        arena.add_child(class, edited_m);
        let added_n = method(&mut arena, "n()", "void n() { m(); }");
        arena.add_child(class, added_n);

        let mut ctx = MergeContext::new(arena, root, root, root);
        ctx.superimposed_tree = root;
        ctx.added_left_nodes.push(added_n);
        ctx.edited_right_nodes.push(edited_m);

        NewElementReferencingEditedOneHandler
            .handle(&mut ctx, &MergeConfig::default())
            .unwrap();
        let conflicts = extract_merge_conflicts(ctx.arena.body(added_n));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].left, "void n() { m(); }");
        assert_eq!(conflicts[0].right, "void m() { x(); y(); }");
    }

    #[test]
    fn unrelated_additions_are_untouched() {
        let (mut ctx, added_n) = deleted_reference_context();
        ctx.arena.set_body(added_n, "void n() { other(); }");
        NewElementReferencingEditedOneHandler
            .handle(&mut ctx, &MergeConfig::default())
            .unwrap();
        assert_eq!(ctx.arena.body(added_n), "void n() { other(); }");
    }

    #[test]
    fn handler_is_idempotent() {
        let (mut ctx, added_n) = deleted_reference_context();
        let cfg = MergeConfig::default();
        NewElementReferencingEditedOneHandler
            .handle(&mut ctx, &cfg)
            .unwrap();
        let once = ctx.arena.body(added_n).to_string();
        NewElementReferencingEditedOneHandler
            .handle(&mut ctx, &cfg)
            .unwrap();
        assert_eq!(ctx.arena.body(added_n), once);
    }
}
