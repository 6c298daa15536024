//! Entries and the source sets that contribute them.
//!
//! Only files are modeled. Directories exist implicitly as path prefixes.

use std::fmt;

use serde::Serialize;

use crate::resource::ResourceId;

/// The kind of input an entry came from. Decides how its content is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A picked directory.
    Directory,
    /// A decoded archive.
    Archive,
    /// A file added on its own.
    Individual,
}

impl SourceKind {
    /// Short label used in tree listings.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Directory => "dir",
            SourceKind::Archive => "archive",
            SourceKind::Individual => "file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Directory => write!(f, "directory"),
            SourceKind::Archive => write!(f, "archive"),
            SourceKind::Individual => write!(f, "individual"),
        }
    }
}

/// Opaque handle sufficient to retrieve an entry's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Transient handle issued by a [`ResourceStore`](crate::resource::ResourceStore).
    Resource(ResourceId),
    /// Key into the archive index installed under `generation`.
    Archive { generation: u64, key: String },
}

/// A single addressable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Forward-slash separated relative path, never starting with `/`.
    pub path: String,
    /// Source the entry was enumerated from.
    pub source: SourceKind,
    #[serde(skip)]
    pub locator: Locator,
}

impl Entry {
    /// Create an entry, normalizing `path`.
    pub fn new(path: impl AsRef<str>, source: SourceKind, locator: Locator) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            source,
            locator,
        }
    }

    /// Zero-indexed nesting depth: the number of `/` in the path.
    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }

    /// Final path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Normalize a relative path to forward slashes with no leading `/`.
pub fn normalize_path(path: &str) -> String {
    let path = if path.contains('\\') {
        path.replace('\\', "/")
    } else {
        path.to_string()
    };
    path.trim_start_matches('/').to_string()
}

/// Ordered entries produced by one enumeration pass over one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    kind: SourceKind,
    entries: Vec<Entry>,
}

impl SourceSet {
    /// Create an empty set for the given source kind.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Append an entry owned by this set's source.
    pub fn push(&mut self, path: impl AsRef<str>, locator: Locator) {
        self.entries.push(Entry::new(path, self.kind, locator));
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resource handles owned by this set, for release on replacement.
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.entries.iter().filter_map(|e| match e.locator {
            Locator::Resource(id) => Some(id),
            Locator::Archive { .. } => None,
        })
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
