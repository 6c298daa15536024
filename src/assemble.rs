//! Resolving selected entries to text.
//!
//! Retrievals fan out over the rayon pool and are gathered back by
//! position. Any failure fails the whole call; no partial output is
//! returned.

use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::entry::{Entry, SourceKind};
use crate::errors::CollateError;
use crate::resource::{ContentSource, RetrievalError};

/// A resolved file, ready for formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub source: SourceKind,
    pub text: String,
}

impl FileContent {
    pub fn lines(&self) -> usize {
        self.text.lines().count()
    }
}

/// Resolve `selected` to text, in input order.
///
/// Every retrieval runs even if a sibling fails; the reported error is the
/// first failure in input order.
pub fn resolve<S>(selected: &[Entry], source: &S) -> Result<Vec<FileContent>, CollateError>
where
    S: ContentSource + ?Sized,
{
    let results: Vec<Result<FileContent, CollateError>> = selected
        .par_iter()
        .map(|entry| resolve_one(entry, source))
        .collect();

    results.into_iter().collect()
}

fn resolve_one<S>(entry: &Entry, source: &S) -> Result<FileContent, CollateError>
where
    S: ContentSource + ?Sized,
{
    let text = source
        .fetch(entry)
        .and_then(|bytes| String::from_utf8(bytes).map_err(RetrievalError::from))
        .map_err(|e| {
            debug!("retrieval of {} ({}) failed: {}", entry.path, entry.source, e);
            CollateError::Retrieval {
                path: entry.path.clone(),
                source: e,
            }
        })?;

    Ok(FileContent {
        path: entry.path.clone(),
        source: entry.source,
        text,
    })
}
