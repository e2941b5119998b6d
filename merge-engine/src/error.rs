//! Error taxonomy of the merge engine.

use std::path::PathBuf;

use thiserror::Error;

/// The input could not be turned into a tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Interpreted as "the file was deleted in one version" by the merge
    /// entry points.
    #[error("the file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("the file {} is not a .java file (pass --git to merge arbitrary paths)", .0.display())]
    NotJavaFile(PathBuf),

    #[error("the file {} is not valid UTF-8", .0.display())]
    Encoding(PathBuf),

    #[error("syntax error while parsing {}", .0.display())]
    Syntax(PathBuf),

    #[error("failed to load the Java grammar: {0}")]
    Language(String),
}

/// The line-based merger failed on one leaf's contributions. Carries the
/// three inputs for diagnostics.
#[derive(Debug, Error)]
#[error("textual merge failed: {message}")]
pub struct TextualMergeError {
    pub message: String,
    pub left: String,
    pub base: String,
    pub right: String,
}

/// Any failure during superimposition or in a conflict handler. The caller
/// is expected to fall back to a plain textual merge of the whole file.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SemistructuredMergeError {
    pub message: String,
}

impl SemistructuredMergeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Umbrella error of the public merge entry points.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Textual(#[from] TextualMergeError),

    #[error(transparent)]
    Semistructured(#[from] SemistructuredMergeError),
}
