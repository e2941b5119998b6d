//! Method and constructor renamings and deletions.
//!
//! A side that renamed a method leaves two traces: the old node's
//! contribution is empty (a delete-vs-edit conflict if the other side edited
//! it), and a similar-bodied node appears among that side's additions. The
//! handler pairs the two by body similarity against the base body and
//! classifies the case:
//!
//! - **safe rename** — the renamed body, the base body and the opposite
//!   side's edited body merge cleanly: the edits flow into the renamed
//!   declaration and the old conflict disappears;
//! - **unsafe rename** — the three-way merge itself conflicts: a textual
//!   conflict bracketing both candidates replaces the raw one;
//! - **deletion** — no addition is similar enough: the delete-vs-edit
//!   conflict produced by the content merger stands.

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::{
    content_similarity, extract_merge_conflicts, format_conflict, normalized_single_line,
};
use crate::textual::TextualMergeStrategy;
use crate::tree::NodeId;

use super::{ConflictHandler, Side};

/// Minimum similarity between an added body and the base body for the
/// addition to count as a renaming of the old element.
const RENAMING_SIMILARITY_THRESHOLD: f32 = 0.7;

pub struct MethodAndConstructorRenamingAndDeletionHandler;

impl ConflictHandler for MethodAndConstructorRenamingAndDeletionHandler {
    fn name(&self) -> &'static str {
        "renaming-and-deletion"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        let strategy = cfg.make_strategy();
        for (base_content, node) in ctx.possible_renamed_left_nodes.clone() {
            resolve(ctx, cfg, strategy.as_ref(), &base_content, node, Side::Left)?;
        }
        for (base_content, node) in ctx.possible_renamed_right_nodes.clone() {
            resolve(ctx, cfg, strategy.as_ref(), &base_content, node, Side::Right)?;
        }
        Ok(())
    }
}

fn resolve(
    ctx: &mut MergeContext,
    cfg: &MergeConfig,
    strategy: &dyn TextualMergeStrategy,
    base_content: &str,
    node: NodeId,
    side: Side,
) -> Result<(), TextualMergeError> {
    let root = ctx.superimposed_tree;
    if !ctx.arena.is_terminal(node) || !ctx.arena.is_attached_under(node, root) {
        return Ok(());
    }
    let body = ctx.arena.body(node).to_string();
    let conflicts = extract_merge_conflicts(&body);
    let Some(conflict) = conflicts.first() else {
        // The deletion merged cleanly; nothing to repair.
        return Ok(());
    };
    // The surviving content contributed by the side that kept the element.
    let edited = match side {
        Side::Left => conflict.right.clone(),
        Side::Right => conflict.left.clone(),
    };

    let Some(candidate) = renaming_candidate(ctx, base_content, node, side) else {
        // Genuine deletion: the delete-vs-edit conflict stands.
        return Ok(());
    };

    let candidate_body = ctx.arena.body(candidate).to_string();
    let (left, right) = match side {
        Side::Left => (candidate_body.as_str(), edited.as_str()),
        Side::Right => (edited.as_str(), candidate_body.as_str()),
    };
    let merged = strategy.merge(left, base_content, right, cfg.ignore_whitespace)?;

    if extract_merge_conflicts(&merged).is_empty() {
        // Safe: the opposite side's edits flow into the renamed declaration.
        ctx.arena.set_body(candidate, merged);
        ctx.arena.set_body(node, "");
        ctx.arena.set_prefix(node, "");
    } else {
        // Unsafe: both candidates surface in one conflict.
        ctx.arena
            .set_body(node, format_conflict(left, base_content, right, cfg.show_base));
        ctx.arena.set_body(candidate, "");
        ctx.arena.set_prefix(candidate, "");
    }
    Ok(())
}

/// The most similar addition on the renaming side, if similar enough to the
/// base body to count as a rename.
fn renaming_candidate(
    ctx: &MergeContext,
    base_content: &str,
    conflict_node: NodeId,
    side: Side,
) -> Option<NodeId> {
    let root = ctx.superimposed_tree;
    let added = match side {
        Side::Left => &ctx.added_left_nodes,
        Side::Right => &ctx.added_right_nodes,
    };
    let base_normalized = normalized_single_line(base_content);
    added
        .iter()
        .copied()
        .filter(|&n| n != conflict_node)
        .filter(|&n| ctx.arena.is_terminal(n) && ctx.arena.is_attached_under(n, root))
        .filter(|&n| {
            matches!(
                ctx.arena.node(n).node_type.as_str(),
                "MethodDecl" | "ConstructorDecl"
            )
        })
        .map(|n| {
            let similarity = content_similarity(
                &normalized_single_line(ctx.arena.body(n)),
                &base_normalized,
            );
            (n, similarity)
        })
        .filter(|&(_, similarity)| similarity >= RENAMING_SIMILARITY_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
}
