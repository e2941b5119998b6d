//! Import declarations whose simple names collide.
//!
//! When left and right each add an import ending in the same simple name but
//! rooted in different packages, every unqualified reference to that name
//! stops compiling. The tree shows no overlap — two distinct leaves — so the
//! handler re-emits the collision as a textual conflict.

use tracing::warn;

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::files::{format_conflict, has_conflict_markers, normalized_single_line};
use crate::tree::NodeId;

use super::ConflictHandler;

pub struct TypeAmbiguityErrorHandler;

impl ConflictHandler for TypeAmbiguityErrorHandler {
    fn name(&self) -> &'static str {
        "type-ambiguity"
    }

    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError> {
        let root = ctx.superimposed_tree;
        let left_imports: Vec<_> = ctx
            .added_left_nodes
            .iter()
            .copied()
            .filter(|&n| is_live_import(ctx, n, root))
            .collect();
        let right_imports: Vec<_> = ctx
            .added_right_nodes
            .iter()
            .copied()
            .filter(|&n| is_live_import(ctx, n, root))
            .collect();

        for &left in &left_imports {
            for &right in &right_imports {
                if left == right
                    || ctx.arena.node(left).parent != ctx.arena.node(right).parent
                {
                    continue;
                }
                let left_body = ctx.arena.body(left).to_string();
                let right_body = ctx.arena.body(right).to_string();
                if normalized_single_line(&left_body) == normalized_single_line(&right_body) {
                    continue;
                }
                let (Some(l_name), Some(r_name)) =
                    (import_simple_name(&left_body), import_simple_name(&right_body))
                else {
                    continue;
                };
                if l_name != r_name || has_conflict_markers(&left_body) {
                    continue;
                }

                warn!(name = %l_name, "imports from both sides make a type ambiguous");
                let conflict = format_conflict(&left_body, "", &right_body, cfg.show_base);
                ctx.arena.set_body(left, conflict);
                ctx.arena.detach(right);
            }
        }
        Ok(())
    }
}

fn is_live_import(ctx: &MergeContext, node: NodeId, root: NodeId) -> bool {
    ctx.arena.node(node).node_type == "ImportDecl" && ctx.arena.is_attached_under(node, root)
}

/// Simple name of a single-type import; `None` for wildcard imports.
fn import_simple_name(body: &str) -> Option<String> {
    let path = body.trim().strip_prefix("import")?.trim();
    let path = path.strip_prefix("static ").map_or(path, str::trim);
    let path = path.trim_end_matches(';').trim();
    if path.ends_with('*') {
        return None;
    }
    path.rsplit('.').next().map(str::to_string)
}
