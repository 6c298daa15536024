//! Merging source sets into one deduplicated tree.
//!
//! Merging is append-dedup: earlier entries keep their position and win on
//! a path conflict, later entries are appended in their own order.

use indexmap::IndexMap;

use crate::entry::{Entry, SourceSet};

/// Deduplicated union of source sets, keyed by path in admission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTree {
    entries: IndexMap<String, Entry>,
}

impl MergedTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `entry` unless its path is already present.
    ///
    /// Returns whether the entry was admitted.
    pub fn admit(&mut self, entry: Entry) -> bool {
        if self.entries.contains_key(&entry.path) {
            return false;
        }
        self.entries.insert(entry.path.clone(), entry);
        true
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries.into_values().collect()
    }
}

impl From<&SourceSet> for MergedTree {
    fn from(set: &SourceSet) -> Self {
        merge(MergedTree::new(), set)
    }
}

impl FromIterator<Entry> for MergedTree {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut tree = MergedTree::new();
        for entry in iter {
            tree.admit(entry);
        }
        tree
    }
}

/// Append the entries of `secondary` whose paths are not yet in `primary`.
pub fn merge(mut primary: MergedTree, secondary: &SourceSet) -> MergedTree {
    for entry in secondary {
        primary.admit(entry.clone());
    }
    primary
}

/// Fold source sets left to right. Earlier sets win on conflicts.
pub fn merge_all<'a, I>(sets: I) -> MergedTree
where
    I: IntoIterator<Item = &'a SourceSet>,
{
    sets.into_iter().fold(MergedTree::new(), merge)
}
