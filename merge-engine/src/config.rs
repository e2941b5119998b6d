//! Merge run configuration.
//!
//! All feature flags and the textual strategy selector are collected into an
//! immutable value passed down the pipeline; the engine never consults
//! process-global state, so concurrent merges with different configurations
//! are safe at file granularity.

use crate::textual::{CsDiffAndDiff3, Diff3, TextualMergeStrategy};

/// Which line-based merge strategy backs the content merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Plain diff3-style merge.
    #[default]
    Diff3,
    /// Consistent-signature diff first, falling back to diff3 on conflict.
    CsDiffAndDiff3,
}

/// Configuration for one merge run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Include the base contribution in conflict blocks.
    pub show_base: bool,
    /// Compare lines with all whitespace stripped, avoiding spurious
    /// conflicts from reformatting.
    pub ignore_whitespace: bool,
    /// Running as a git merge driver: inputs may carry arbitrary temp names,
    /// so the `.java` extension check is skipped and per-file chatter is
    /// suppressed.
    pub is_git: bool,
    pub strategy: StrategyKind,

    pub type_ambiguity_error_handler: bool,
    pub new_element_referencing_edited_one_handler: bool,
    pub method_and_constructor_renaming_and_deletion_handler: bool,
    pub initialization_blocks_handler: bool,
    /// Only consulted when the single-block variant is disabled.
    pub initialization_blocks_handler_multiple_blocks: bool,
    pub duplicated_declaration_handler: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            show_base: false,
            ignore_whitespace: true,
            is_git: false,
            strategy: StrategyKind::Diff3,
            type_ambiguity_error_handler: true,
            new_element_referencing_edited_one_handler: true,
            method_and_constructor_renaming_and_deletion_handler: true,
            initialization_blocks_handler: true,
            initialization_blocks_handler_multiple_blocks: false,
            duplicated_declaration_handler: true,
        }
    }
}

impl MergeConfig {
    /// Instantiates the configured textual strategy.
    pub fn make_strategy(&self) -> Box<dyn TextualMergeStrategy> {
        match self.strategy {
            StrategyKind::Diff3 => Box::new(Diff3 {
                show_base: self.show_base,
            }),
            StrategyKind::CsDiffAndDiff3 => Box::new(CsDiffAndDiff3 {
                show_base: self.show_base,
            }),
        }
    }
}
