//! Locator registry and archive index.
//!
//! Directory and individual entries hold transient [`ResourceId`] handles
//! issued by a [`ResourceStore`]. Archive entries hold a key into the archive
//! index installed in an [`ArchiveSlot`], tagged with the generation of that
//! install. Released handles and stale generations resolve to
//! [`RetrievalError::SourceReplaced`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use thiserror::Error;

use crate::entry::{Entry, Locator};

/// Errors retrieving one entry's bytes.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("source was replaced; locator no longer resolves")]
    SourceReplaced,

    #[error("archive has no entry `{0}`")]
    MissingArchiveEntry(String),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("content is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Transient handle to a registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Backing storage of a resource.
#[derive(Debug, Clone)]
pub enum Resource {
    /// A file on disk, read on every fetch.
    File(PathBuf),
    /// Bytes held in memory.
    Bytes(Arc<[u8]>),
}

impl Resource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Resource::File(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Resource::Bytes(bytes.into())
    }

    fn read(&self) -> Result<Vec<u8>, RetrievalError> {
        match self {
            Resource::File(path) => Ok(std::fs::read(path)?),
            Resource::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Path on disk, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resource::File(path) => Some(path),
            Resource::Bytes(_) => None,
        }
    }
}

/// Registry of live resource handles.
#[derive(Debug, Default)]
pub struct ResourceStore {
    next: AtomicU64,
    live: RwLock<HashMap<ResourceId, Resource>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource and return a fresh handle.
    pub fn register(&self, resource: Resource) -> ResourceId {
        let id = ResourceId(self.next.fetch_add(1, Ordering::Relaxed));
        self.live.write().insert(id, resource);
        id
    }

    /// Release a handle. Returns false if it was not live.
    pub fn release(&self, id: ResourceId) -> bool {
        self.live.write().remove(&id).is_some()
    }

    /// Release many handles under one lock. Returns how many were live.
    pub fn release_all<I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = ResourceId>,
    {
        let mut live = self.live.write();
        ids.into_iter().filter(|id| live.remove(id).is_some()).count()
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.read().contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.read().len()
    }

    /// Read the bytes behind a handle.
    pub fn fetch(&self, id: ResourceId) -> Result<Vec<u8>, RetrievalError> {
        // Clone out so the lock is not held across I/O.
        let resource = self
            .live
            .read()
            .get(&id)
            .cloned()
            .ok_or(RetrievalError::SourceReplaced)?;
        resource.read()
    }
}

/// A decoded archive, as handed over by an archive decoder.
#[derive(Debug, Clone, Default)]
pub struct ArchiveContents {
    /// File paths in archive order.
    pub entries: Vec<String>,
    /// Path to content.
    pub index: HashMap<String, Arc<[u8]>>,
    /// Rules found in `.gitignore` files inside the archive, already rebased.
    pub gitignore_rules: Vec<String>,
}

impl ArchiveContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file entry with its content.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        let content: Vec<u8> = content.into();
        self.index.insert(path.clone(), content.into());
        self.entries.push(path);
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.gitignore_rules.push(rule.into());
        self
    }
}

#[derive(Debug)]
struct ArchiveIndex {
    generation: u64,
    files: HashMap<String, Arc<[u8]>>,
}

/// Holds the currently decoded archive index, if any.
#[derive(Debug, Default)]
pub struct ArchiveSlot {
    generations: AtomicU64,
    current: RwLock<Option<ArchiveIndex>>,
}

impl ArchiveSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current index. Returns the new generation.
    pub fn install(&self, files: HashMap<String, Arc<[u8]>>) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.current.write().replace(ArchiveIndex { generation, files });
        if let Some(previous) = previous {
            debug!(
                "archive index generation {} replaced by {}",
                previous.generation, generation
            );
        }
        generation
    }

    /// Drop the current index.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Generation of the installed index.
    pub fn generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|index| index.generation)
    }

    pub fn fetch(&self, generation: u64, key: &str) -> Result<Vec<u8>, RetrievalError> {
        let current = self.current.read();
        let index = current
            .as_ref()
            .filter(|index| index.generation == generation)
            .ok_or(RetrievalError::SourceReplaced)?;
        index
            .files
            .get(key)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| RetrievalError::MissingArchiveEntry(key.to_string()))
    }
}

/// Retrieves the bytes behind an entry.
pub trait ContentSource: Sync {
    fn fetch(&self, entry: &Entry) -> Result<Vec<u8>, RetrievalError>;
}

/// Shared handles to the resource store and archive slot.
///
/// Cheap to clone; a clone keeps resolving against the live state, so
/// handles released after it was taken fail with `SourceReplaced`.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    resources: Arc<ResourceStore>,
    archive: Arc<ArchiveSlot>,
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn archive(&self) -> &ArchiveSlot {
        &self.archive
    }
}

impl ContentSource for Sources {
    fn fetch(&self, entry: &Entry) -> Result<Vec<u8>, RetrievalError> {
        match &entry.locator {
            Locator::Resource(id) => self.resources.fetch(*id),
            Locator::Archive { generation, key } => self.archive.fetch(*generation, key),
        }
    }
}
