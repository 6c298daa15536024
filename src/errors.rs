//! Error types for collate.

use std::path::PathBuf;

use crate::archive::ArchiveError;
use crate::output::OutputError;
use crate::resource::RetrievalError;
use crate::walker::WalkError;

/// Top-level error type for collate operations.
///
/// Per-rule pattern failures never reach this type; they are logged and
/// the rule is skipped.
#[derive(Debug, thiserror::Error)]
pub enum CollateError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("no files selected after filtering")]
    EmptySelection,

    #[error("failed to read {path}: {source}")]
    Retrieval {
        path: String,
        #[source]
        source: RetrievalError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl CollateError {
    /// True when a retrieval failed because its source was replaced.
    pub fn is_source_replaced(&self) -> bool {
        matches!(
            self,
            CollateError::Retrieval {
                source: RetrievalError::SourceReplaced,
                ..
            }
        )
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &CollateError) -> i32 {
    match error {
        CollateError::PathNotFound(_) => 3,
        CollateError::EmptySelection => 5,
        CollateError::Retrieval { .. } => 6,
        CollateError::Io(_) => 1,
        CollateError::Walk(_) => 2,
        CollateError::Archive(_) => 4,
        CollateError::Output(_) => 1,
    }
}
