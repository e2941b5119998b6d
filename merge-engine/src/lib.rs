//! # ssmerge-engine
//!
//! A semistructured three-way merge engine for Java source files.
//!
//! Given a common ancestor and two descendants, the engine parses all three
//! into declaration-level trees and merges them by *superimposition*:
//! recursive matching of nodes by structural and nominal identity, beginning
//! from the root. Declarations only one side touched merge without ever
//! looking at line diffs; matched leaf bodies are handed to a line-based
//! merger; a pipeline of conflict handlers then refines the raw result —
//! renamings, references to elements the other side changed, colliding
//! declarations, initializer blocks, deletions.
//!
//! ## Pipeline
//!
//! 1. parse `left`, `base`, `right` (tree-sitter-java behind a
//!    declaration-level adapter)
//! 2. superimpose(left, base), then superimpose(that, right), tagging each
//!    matched leaf with its three contributions
//! 3. drop base nodes deleted on both sides
//! 4. split every tagged leaf and merge it textually (diff3, or
//!    consistent-signature diff with diff3 fallback)
//! 5. run the configured conflict handlers in a fixed order
//! 6. pretty-print the merged tree
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use ssmerge_engine::{semistructured_merge, MergeConfig};
//!
//! let cfg = MergeConfig::default();
//! let merged = semistructured_merge(
//!     Path::new("Left.java"),
//!     Path::new("Base.java"),
//!     Path::new("Right.java"),
//!     &cfg,
//! )?;
//! print!("{merged}");
//! # Ok::<(), ssmerge_engine::MergeError>(())
//! ```

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod files;
pub mod handlers;
pub mod matcher;
pub mod merge;
pub mod parser;
pub mod printer;
pub mod superimposer;
pub mod textual;
pub mod tree;

// Re-export the primary public API.
pub use config::{MergeConfig, StrategyKind};
pub use context::MergeContext;
pub use error::{MergeError, ParseError, SemistructuredMergeError, TextualMergeError};
pub use handlers::{assemble_handlers, ConflictHandler};
pub use merge::{
    semistructured_merge, semistructured_merge_sources, semistructured_merge_with_handlers,
    three_way_textual_merge, FILE_DELETED_MESSAGE,
};
pub use textual::{CsDiffAndDiff3, Diff3, TextualMergeStrategy};
pub use tree::{MergingMechanism, Node, NodeArena, NodeId, NodeKind, Origin};
