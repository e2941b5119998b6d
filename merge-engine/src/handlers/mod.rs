//! Conflict handlers: ordered post-processors over the merged tree.
//!
//! After the content merger has textually merged every matched leaf, a
//! sequence of handlers refines the raw result — detecting renamings,
//! references to elements the other side changed, colliding declarations,
//! initializer-block interleavings, and deletions. Each handler is a value
//! behind one capability; the list is assembled per run from the
//! configuration and the order below is part of the contract.

use crate::config::MergeConfig;
use crate::context::MergeContext;
use crate::error::TextualMergeError;
use crate::tree::{NodeArena, NodeId};

mod deletions;
mod duplicated_declaration;
mod initialization_blocks;
mod new_element;
mod renaming;
mod type_ambiguity;

pub use deletions::DeletionsHandler;
pub use duplicated_declaration::DuplicatedDeclarationHandler;
pub use initialization_blocks::{
    InitializationBlocksHandler, InitializationBlocksHandlerMultipleBlocks,
};
pub use new_element::NewElementReferencingEditedOneHandler;
pub use renaming::MethodAndConstructorRenamingAndDeletionHandler;
pub use type_ambiguity::TypeAmbiguityErrorHandler;

/// A post-processor mutating the merged tree to resolve one family of
/// conflicts. Textual failures inside a handler surface as a
/// semistructured-merge failure at the pipeline level.
pub trait ConflictHandler {
    fn name(&self) -> &'static str;
    fn handle(&self, ctx: &mut MergeContext, cfg: &MergeConfig) -> Result<(), TextualMergeError>;
}

/// Builds the handler list for one run. The deletions handler is always on;
/// the multiple-blocks initializer variant runs only when the single-block
/// variant is disabled.
pub fn assemble_handlers(cfg: &MergeConfig) -> Vec<Box<dyn ConflictHandler>> {
    let mut handlers: Vec<Box<dyn ConflictHandler>> = Vec::new();
    if cfg.type_ambiguity_error_handler {
        handlers.push(Box::new(TypeAmbiguityErrorHandler));
    }
    if cfg.new_element_referencing_edited_one_handler {
        handlers.push(Box::new(NewElementReferencingEditedOneHandler));
    }
    if cfg.method_and_constructor_renaming_and_deletion_handler {
        handlers.push(Box::new(MethodAndConstructorRenamingAndDeletionHandler));
    }
    if !cfg.initialization_blocks_handler && cfg.initialization_blocks_handler_multiple_blocks {
        handlers.push(Box::new(InitializationBlocksHandlerMultipleBlocks));
    }
    if cfg.initialization_blocks_handler {
        handlers.push(Box::new(InitializationBlocksHandler));
    }
    if cfg.duplicated_declaration_handler {
        handlers.push(Box::new(DuplicatedDeclarationHandler));
    }
    handlers.push(Box::new(DeletionsHandler));
    handlers
}

/// Which side of the merge performed an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// The identifier a declaration introduces into its scope: the bare method
/// or constructor name, the first declared variable of a field, or the enum
/// constant name.
pub(crate) fn declared_identifier(arena: &NodeArena, node: NodeId) -> Option<String> {
    let n = arena.node(node);
    match n.node_type.as_str() {
        "MethodDecl" | "ConstructorDecl" => {
            Some(n.name.split('(').next().unwrap_or_default().to_string())
        }
        "FieldDecl" => field_identifier(arena.body(node)),
        "EnumConstantDecl" => Some(n.name.clone()),
        _ => None,
    }
}

/// Declared variable name of a field declaration, read off its source text.
pub(crate) fn field_identifier(body: &str) -> Option<String> {
    let declarator = body.split('=').next()?;
    let declarator = declarator
        .trim_end()
        .trim_end_matches(';')
        .trim_end()
        .trim_end_matches(|c| c == '[' || c == ']')
        .trim_end();
    let ident: String = declarator
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    if ident.is_empty() {
        None
    } else {
        Some(ident.chars().rev().collect())
    }
}

/// Whole-word occurrence check for a Java identifier.
pub(crate) fn references_identifier(content: &str, identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    let is_ident_char = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    let mut search_from = 0;
    while let Some(found) = content[search_from..].find(identifier) {
        let start = search_from + found;
        let end = start + identifier.len();
        let before_ok = start == 0
            || !content[..start]
                .chars()
                .next_back()
                .is_some_and(is_ident_char);
        let after_ok = end == content.len()
            || !content[end..].chars().next().is_some_and(is_ident_char);
        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_order_is_fixed() {
        let cfg = MergeConfig::default();
        let names: Vec<&str> = assemble_handlers(&cfg).iter().map(|h| h.name()).collect();
        assert_eq!(
            names,
            vec![
                "type-ambiguity",
                "new-element-referencing-edited-one",
                "renaming-and-deletion",
                "initialization-blocks",
                "duplicated-declaration",
                "deletions",
            ]
        );
    }

    #[test]
    fn multiple_blocks_variant_requires_single_variant_off() {
        let cfg = MergeConfig {
            initialization_blocks_handler: false,
            initialization_blocks_handler_multiple_blocks: true,
            ..MergeConfig::default()
        };
        let names: Vec<&str> = assemble_handlers(&cfg).iter().map(|h| h.name()).collect();
        assert!(names.contains(&"initialization-blocks-multiple"));
        assert!(!names.contains(&"initialization-blocks"));

        let both = MergeConfig {
            initialization_blocks_handler: true,
            initialization_blocks_handler_multiple_blocks: true,
            ..MergeConfig::default()
        };
        let names: Vec<&str> = assemble_handlers(&both).iter().map(|h| h.name()).collect();
        assert!(!names.contains(&"initialization-blocks-multiple"));
    }

    #[test]
    fn deletions_handler_is_always_last() {
        let cfg = MergeConfig {
            type_ambiguity_error_handler: false,
            new_element_referencing_edited_one_handler: false,
            method_and_constructor_renaming_and_deletion_handler: false,
            initialization_blocks_handler: false,
            duplicated_declaration_handler: false,
            ..MergeConfig::default()
        };
        let names: Vec<&str> = assemble_handlers(&cfg).iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["deletions"]);
    }

    #[test]
    fn field_identifier_handles_initializers_and_arrays() {
        assert_eq!(field_identifier("int k = 0;").as_deref(), Some("k"));
        assert_eq!(field_identifier("private final String name;").as_deref(), Some("name"));
        assert_eq!(field_identifier("int[] xs = {1};").as_deref(), Some("xs"));
        assert_eq!(field_identifier("int ys[];").as_deref(), Some("ys"));
    }

    #[test]
    fn identifier_references_are_whole_word() {
        assert!(references_identifier("void n() { m(); }", "m"));
        assert!(!references_identifier("void n() { ma(); }", "m"));
        assert!(!references_identifier("void n() { am(); }", "m"));
        assert!(references_identifier("x = m;", "m"));
    }
}
