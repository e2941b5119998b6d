//! Content merging of matched leaves.
//!
//! After both superimposition passes, every matched `ConflictMerge` leaf
//! holds its three contributions spliced together with the internal
//! sentinels. This module splits them back apart, records which side edited
//! what (feeding the handler pipeline), and hands the triple to the
//! configured textual merger.

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::normalized_single_line;
use crate::superimposer::{SEMANTIC_MARKER, SEPARATOR};
use crate::textual::TextualMergeStrategy;
use crate::tree::NodeId;

/// Walks the merged tree, textually merging every tagged body and prefix.
pub(crate) fn merge_matched_content(
    ctx: &mut MergeContext,
    node: NodeId,
    cfg: &MergeConfig,
    strategy: &dyn TextualMergeStrategy,
) -> Result<(), TextualMergeError> {
    if !ctx.arena.is_terminal(node) {
        let children = ctx.arena.children(node).to_vec();
        for child in children {
            merge_matched_content(ctx, child, cfg, strategy)?;
        }
        return Ok(());
    }

    if ctx.arena.body(node).contains(SEPARATOR) {
        let merged = merge_body_content(ctx, node, cfg, strategy)?;
        ctx.arena.set_body(node, merged);
    }

    if ctx.arena.prefix(node).contains(SEPARATOR) {
        let (left, base, right) = split_contributions(ctx.arena.prefix(node));
        let merged = compare_and_merge(&left, &base, &right);
        ctx.arena.set_prefix(node, merged);
    }

    Ok(())
}

fn merge_body_content(
    ctx: &mut MergeContext,
    node: NodeId,
    cfg: &MergeConfig,
    strategy: &dyn TextualMergeStrategy,
) -> Result<String, TextualMergeError> {
    let (left, base, right) = split_contributions(ctx.arena.body(node));
    let left = left.trim().to_string();
    let base = base.trim().to_string();
    let right = right.trim().to_string();

    identify_nodes_edited_in_only_one_version(ctx, node, &left, &base, &right);
    if cfg.method_and_constructor_renaming_and_deletion_handler {
        identify_possible_deletions_or_renamings(ctx, node, &left, &base, &right);
    }

    strategy.merge(&left, &base, &right, cfg.ignore_whitespace)
}

/// Splits a tagged content string into its left, base and right parts,
/// stripping the semantic marker. Missing parts are empty.
pub(crate) fn split_contributions(content: &str) -> (String, String, String) {
    let mut parts = content.split(SEPARATOR);
    let left = parts
        .next()
        .unwrap_or("")
        .replace(SEMANTIC_MARKER, "");
    let base = parts.next().unwrap_or("").to_string();
    let right = parts.next().unwrap_or("").to_string();
    (left, base, right)
}

/// A leaf was edited by exactly one side when base agrees with the other
/// side. Comparisons use the whitespace-normalized single-line form.
fn identify_nodes_edited_in_only_one_version(
    ctx: &mut MergeContext,
    node: NodeId,
    left: &str,
    base: &str,
    right: &str,
) {
    let left_n = normalized_single_line(left);
    let base_n = normalized_single_line(base);
    let right_n = normalized_single_line(right);
    if base_n.is_empty() {
        return;
    }
    if base_n == left_n && right_n != left_n {
        ctx.edited_right_nodes.push(node);
    } else if base_n == right_n && left_n != right_n {
        ctx.edited_left_nodes.push(node);
    }
}

/// A side that emptied the body relative to base either deleted or renamed
/// the element; the renaming handler decides which.
fn identify_possible_deletions_or_renamings(
    ctx: &mut MergeContext,
    node: NodeId,
    left: &str,
    base: &str,
    right: &str,
) {
    let left_n = normalized_single_line(left);
    let base_n = normalized_single_line(base);
    let right_n = normalized_single_line(right);
    if base_n.is_empty() {
        return;
    }
    if base_n != left_n && right_n.is_empty() {
        ctx.possible_renamed_right_nodes
            .push((base.to_string(), node));
    } else if base_n != right_n && left_n.is_empty() {
        ctx.possible_renamed_left_nodes
            .push((base.to_string(), node));
    }
}

/// Lightweight three-way merge used for special token prefixes (comments):
/// takes the changed side when only one changed, and is left-biased when
/// both changed differently.
pub(crate) fn compare_and_merge(left: &str, base: &str, right: &str) -> String {
    let left_n = normalized_single_line(left);
    let base_n = normalized_single_line(base);
    let right_n = normalized_single_line(right);
    if left_n == base_n {
        right.to_string()
    } else if right_n == base_n || left_n == right_n {
        left.to_string()
    } else {
        left.to_string()
    }
}
