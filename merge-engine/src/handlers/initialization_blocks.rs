//! Initializer block handling.
//!
//! Static and instance initializer blocks carry no name, so superimposition
//! matches them purely by position within their fixed identity — which goes
//! wrong as soon as both sides insert or reorder blocks independently. Both
//! handlers rebuild each class's blocks from the three *source* trees, which
//! still hold the untouched originals, and replace whatever the raw merge
//! produced.
//!
//! The single-block variant merges the (at most one per tree) block of each
//! kind textually. The multiple-blocks variant pairs ≥ 2 blocks with their
//! base counterparts by similarity, merges each triple, and keeps one-sided
//! insertions, collapsing identical ones.

use std::collections::BTreeMap;

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::{content_similarity, normalized_single_line};
use crate::textual::TextualMergeStrategy;
use crate::tree::{MergingMechanism, NodeId};

use super::ConflictHandler;

/// Minimum similarity for pairing a side's block with a base block.
const BLOCK_MATCHING_THRESHOLD: f32 = 0.5;

pub struct InitializationBlocksHandler;

impl ConflictHandler for InitializationBlocksHandler {
    fn name(&self) -> &'static str {
        "initialization-blocks"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        let strategy = cfg.make_strategy();
        for (key, merged_ids) in blocks_by_group(ctx, ctx.superimposed_tree) {
            let left = group_bodies(ctx, ctx.left_tree, &key);
            let base = group_bodies(ctx, ctx.base_tree, &key);
            let right = group_bodies(ctx, ctx.right_tree, &key);
            if left.len() > 1 || base.len() > 1 || right.len() > 1 {
                // More than one block per tree is the multiple-blocks
                // variant's business.
                continue;
            }
            let merged = strategy.merge(
                left.first().map(String::as_str).unwrap_or("").trim(),
                base.first().map(String::as_str).unwrap_or("").trim(),
                right.first().map(String::as_str).unwrap_or("").trim(),
                cfg.ignore_whitespace,
            )?;
            replace_blocks(ctx, &merged_ids, vec![merged]);
        }
        Ok(())
    }
}

pub struct InitializationBlocksHandlerMultipleBlocks;

impl ConflictHandler for InitializationBlocksHandlerMultipleBlocks {
    fn name(&self) -> &'static str {
        "initialization-blocks-multiple"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        let strategy = cfg.make_strategy();
        for (key, merged_ids) in blocks_by_group(ctx, ctx.superimposed_tree) {
            let left = group_bodies(ctx, ctx.left_tree, &key);
            let base = group_bodies(ctx, ctx.base_tree, &key);
            let right = group_bodies(ctx, ctx.right_tree, &key);
            let merged = merge_block_group(strategy.as_ref(), cfg, &left, &base, &right)?;
            replace_blocks(ctx, &merged_ids, merged);
        }
        Ok(())
    }
}

/// Pairs base blocks with their most similar counterpart on each side, then
/// merges each triple; unmatched side blocks are insertions.
fn merge_block_group(
    strategy: &dyn TextualMergeStrategy,
    cfg: &MergeConfig,
    left: &[String],
    base: &[String],
    right: &[String],
) -> Result<Vec<String>, TextualMergeError> {
    let mut left_used = vec![false; left.len()];
    let mut right_used = vec![false; right.len()];
    let mut merged = Vec::new();

    for base_block in base {
        let l = claim_most_similar(base_block, left, &mut left_used);
        let r = claim_most_similar(base_block, right, &mut right_used);
        let result = strategy.merge(
            l.unwrap_or("").trim(),
            base_block.trim(),
            r.unwrap_or("").trim(),
            cfg.ignore_whitespace,
        )?;
        if !result.trim().is_empty() {
            merged.push(result);
        }
    }

    // One-sided insertions, identical ones collapsed.
    for (i, block) in left.iter().enumerate() {
        if !left_used[i] {
            merged.push(block.trim().to_string());
        }
    }
    for (i, block) in right.iter().enumerate() {
        if right_used[i] {
            continue;
        }
        let duplicate = merged
            .iter()
            .any(|m| normalized_single_line(m) == normalized_single_line(block));
        if !duplicate {
            merged.push(block.trim().to_string());
        }
    }
    Ok(merged)
}

fn claim_most_similar<'a>(
    base_block: &str,
    side: &'a [String],
    used: &mut [bool],
) -> Option<&'a str> {
    let base_normalized = normalized_single_line(base_block);
    let best = side
        .iter()
        .enumerate()
        .filter(|(i, _)| !used[*i])
        .map(|(i, block)| {
            let similarity =
                content_similarity(&normalized_single_line(block), &base_normalized);
            (i, similarity)
        })
        .filter(|&(_, similarity)| similarity >= BLOCK_MATCHING_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    used[best.0] = true;
    Some(side[best.0].as_str())
}

/// Grouping key of an initializer block: its class path plus block kind, so
/// blocks only ever interact within the same class and kind.
fn block_key(ctx: &MergeContext, node: NodeId) -> String {
    let mut path = vec![ctx.arena.node(node).name.clone()];
    let mut cur = ctx.arena.node(node).parent;
    while let Some(id) = cur {
        let n = ctx.arena.node(id);
        path.push(format!("{}:{}", n.node_type, n.name));
        cur = n.parent;
    }
    path.reverse();
    path.join("/")
}

fn blocks_by_group(ctx: &MergeContext, root: NodeId) -> BTreeMap<String, Vec<NodeId>> {
    let mut groups: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
    for id in ctx.arena.descendant_terminals(root) {
        if ctx.arena.node(id).node_type == "InitializerBlock" {
            groups.entry(block_key(ctx, id)).or_default().push(id);
        }
    }
    groups
}

fn group_bodies(ctx: &MergeContext, root: NodeId, key: &str) -> Vec<String> {
    ctx.arena
        .descendant_terminals(root)
        .into_iter()
        .filter(|&id| ctx.arena.node(id).node_type == "InitializerBlock")
        .filter(|&id| block_key(ctx, id) == key)
        .map(|id| ctx.arena.body(id).to_string())
        .collect()
}

/// Replaces the merged tree's blocks of one group with `bodies`: the first
/// existing node anchors the position, extra nodes are detached or created.
fn replace_blocks(ctx: &mut MergeContext, existing: &[NodeId], bodies: Vec<String>) {
    let bodies: Vec<String> = bodies
        .into_iter()
        .filter(|b| !b.trim().is_empty())
        .collect();

    let Some(&anchor) = existing.first() else {
        return;
    };
    let Some(parent) = ctx.arena.node(anchor).parent else {
        return;
    };
    let (node_type, name) = {
        let n = ctx.arena.node(anchor);
        (n.node_type.clone(), n.name.clone())
    };

    for &extra in existing.iter().skip(1) {
        ctx.arena.detach(extra);
    }
    if bodies.is_empty() {
        ctx.arena.detach(anchor);
        return;
    }

    ctx.arena.set_body(anchor, bodies[0].clone());
    let mut at = ctx
        .arena
        .child_index(parent, anchor)
        .map(|i| i + 1)
        .unwrap_or_else(|| ctx.arena.children(parent).len());
    for body in bodies.into_iter().skip(1) {
        let block = ctx.arena.new_terminal(
            node_type.clone(),
            name.clone(),
            body,
            "",
            MergingMechanism::ConflictMerge,
        );
        ctx.arena.insert_child(parent, at, block);
        at += 1;
    }
}
