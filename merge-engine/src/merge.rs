//! Public merge entry points and pipeline orchestration.
//!
//! A semistructured merge runs as: parse the three inputs, superimpose left
//! over base and that result over right, sweep bilaterally deleted base
//! nodes, textually merge every tagged leaf, snapshot the intermediate
//! serialization, then run the configured conflict handlers in order and
//! serialize the final tree.

use std::path::Path;

use tracing::debug;

use crate::config::MergeConfig;
use crate::content::merge_matched_content;
use crate::context::MergeContext;
use crate::error::{MergeError, ParseError, SemistructuredMergeError, TextualMergeError};
use crate::files::read_file_or_empty;
use crate::handlers::{assemble_handlers, ConflictHandler};
use crate::parser::parse_file;
use crate::printer::print_tree;
use crate::superimposer::{remove_remaining_base_nodes, superimpose, Step};
use crate::textual::{Diff3, TextualMergeStrategy};
use crate::tree::{NodeArena, Origin};

/// Message used when one of the three inputs does not exist.
pub const FILE_DELETED_MESSAGE: &str = "The merged file was deleted in one version.";

/// Three-way semistructured merge of three files with the handler list
/// implied by the configuration.
pub fn semistructured_merge(
    left: &Path,
    base: &Path,
    right: &Path,
    cfg: &MergeConfig,
) -> Result<String, MergeError> {
    let handlers = assemble_handlers(cfg);
    semistructured_merge_with_handlers(left, base, right, cfg, &handlers)
}

/// Three-way semistructured merge with an explicit handler list.
pub fn semistructured_merge_with_handlers(
    left: &Path,
    base: &Path,
    right: &Path,
    cfg: &MergeConfig,
    handlers: &[Box<dyn ConflictHandler>],
) -> Result<String, MergeError> {
    let mut arena = NodeArena::new();
    let left_tree = parse_file(&mut arena, left, cfg).map_err(missing_as_deletion)?;
    let base_tree = parse_file(&mut arena, base, cfg).map_err(missing_as_deletion)?;
    let right_tree = parse_file(&mut arena, right, cfg).map_err(missing_as_deletion)?;

    let ctx = MergeContext::new(arena, left_tree, base_tree, right_tree);
    run_pipeline(ctx, cfg, handlers)
}

/// Semistructured merge over in-memory source text, bypassing the file
/// checks. Used by tests and by callers that already hold the contents.
pub fn semistructured_merge_sources(
    left: &str,
    base: &str,
    right: &str,
    cfg: &MergeConfig,
) -> Result<String, MergeError> {
    let mut arena = NodeArena::new();
    let path = Path::new("input.java");
    let left_tree = crate::parser::parse_source(&mut arena, left, path)?;
    let base_tree = crate::parser::parse_source(&mut arena, base, path)?;
    let right_tree = crate::parser::parse_source(&mut arena, right, path)?;

    let ctx = MergeContext::new(arena, left_tree, base_tree, right_tree);
    run_pipeline(ctx, cfg, &assemble_handlers(cfg))
}

fn run_pipeline(
    mut ctx: MergeContext,
    cfg: &MergeConfig,
    handlers: &[Box<dyn ConflictHandler>],
) -> Result<String, MergeError> {
    merge_trees(&mut ctx, cfg)?;

    // Handlers may need the serialized intermediate result.
    ctx.semistructured_output = print_tree(&ctx.arena, ctx.superimposed_tree);
    for handler in handlers {
        debug!(handler = handler.name(), "running conflict handler");
        handler.handle(&mut ctx, cfg).map_err(|e| {
            SemistructuredMergeError::new(format!(
                "handler {} failed: {}",
                handler.name(),
                e.message
            ))
        })?;
    }

    Ok(print_tree(&ctx.arena, ctx.superimposed_tree))
}

/// Plain three-way textual merge of three files. Missing files are treated
/// as empty.
pub fn three_way_textual_merge(
    left: &Path,
    base: &Path,
    right: &Path,
    ignore_whitespace: bool,
) -> Result<String, TextualMergeError> {
    let left_content = read_file_or_empty(left);
    let base_content = read_file_or_empty(base);
    let right_content = read_file_or_empty(right);
    Diff3 { show_base: false }.merge(
        &left_content,
        &base_content,
        &right_content,
        ignore_whitespace,
    )
}

fn missing_as_deletion(e: ParseError) -> MergeError {
    match e {
        ParseError::MissingFile(_) => {
            SemistructuredMergeError::new(FILE_DELETED_MESSAGE).into()
        }
        other => other.into(),
    }
}

/// Runs both superimposition passes and the content merge, leaving the
/// merged tree and all bookkeeping in `ctx`.
pub(crate) fn merge_trees(ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), MergeError> {
    // Root origins are stamped explicitly; children inherit at match time.
    ctx.arena.node_mut(ctx.left_tree).origin = Some(Origin::Left);
    ctx.arena.node_mut(ctx.base_tree).origin = Some(Origin::Base);
    ctx.arena.node_mut(ctx.right_tree).origin = Some(Origin::Right);

    debug!("superimposing left over base");
    let left_base = superimpose(ctx, ctx.left_tree, ctx.base_tree, None, Step::LeftBase)
        .ok_or_else(|| SemistructuredMergeError::new("input trees are not compatible"))?;
    debug!("superimposing the left/base merge over right");
    let merged = superimpose(ctx, left_base, ctx.right_tree, None, Step::LeftBaseRight)
        .ok_or_else(|| SemistructuredMergeError::new("input trees are not compatible"))?;
    ctx.superimposed_tree = merged;

    remove_remaining_base_nodes(ctx, merged);

    let strategy = cfg.make_strategy();
    merge_matched_content(ctx, merged, cfg, strategy.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const BASE: &str = "class A {\n    void m() {\n        x();\n    }\n}\n";

    #[test]
    fn identity_merge_reproduces_the_input() {
        let cfg = MergeConfig::default();
        let merged = semistructured_merge_sources(BASE, BASE, BASE, &cfg).unwrap();
        let again = semistructured_merge_sources(&merged, &merged, &merged, &cfg).unwrap();
        assert_eq!(merged, again);
        assert!(merged.contains("void m() {"));
    }

    #[test]
    fn one_sided_change_wins() {
        let cfg = MergeConfig::default();
        let edited = "class A {\n    void m() {\n        x();\n        y();\n    }\n}\n";
        let merged = semistructured_merge_sources(edited, BASE, BASE, &cfg).unwrap();
        assert!(merged.contains("y();"));
        let merged = semistructured_merge_sources(BASE, BASE, edited, &cfg).unwrap();
        assert!(merged.contains("y();"));
    }

    #[test]
    fn missing_file_surfaces_the_deletion_message() {
        let cfg = MergeConfig {
            is_git: true,
            ..MergeConfig::default()
        };
        let missing = PathBuf::from("/no/such/left");
        let result = semistructured_merge(
            &missing,
            &PathBuf::from("/no/such/base"),
            &PathBuf::from("/no/such/right"),
            &cfg,
        );
        match result {
            Err(MergeError::Semistructured(e)) => {
                assert_eq!(e.message, FILE_DELETED_MESSAGE);
            }
            other => panic!("expected a semistructured error, got {other:?}"),
        }
    }
}
