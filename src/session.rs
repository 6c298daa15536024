//! Aggregation state and the operations that drive it.
//!
//! A [`Session`] owns the three source sets (directory, archive, individual
//! files) and the shared retrieval state. Views, selections and resolution
//! are derived from it on every call; nothing derived is cached.
//!
//! # Examples
//!
//! ```
//! use collate::filter::FilterCriteria;
//! use collate::resource::{ArchiveContents, Resource};
//! use collate::session::Session;
//!
//! let mut session = Session::new();
//! session.select_archive(
//!     ArchiveContents::new()
//!         .with_file("repo/src/lib.rs", "pub fn hi() {}")
//!         .with_file("repo/debug.log", "noise")
//!         .with_rule("*.log"),
//! );
//! session.add_file("notes.md", Resource::bytes("# notes"));
//!
//! let view = session.view(&FilterCriteria::new());
//! let paths: Vec<_> = view.iter().map(|e| e.path.as_str()).collect();
//! assert_eq!(paths, vec!["notes.md", "repo/src/lib.rs"]);
//!
//! let selected = Session::select(&view, &["repo/src/lib.rs"]).unwrap();
//! let files = session.resolve(&selected).unwrap();
//! assert_eq!(files[0].text, "pub fn hi() {}");
//! ```

use log::debug;

use crate::assemble::{resolve, FileContent};
use crate::entry::{Entry, Locator, SourceKind, SourceSet};
use crate::errors::CollateError;
use crate::filter::{filter, FilterCriteria};
use crate::merge::{merge_all, MergedTree};
use crate::resource::{ArchiveContents, Resource, Sources};
use crate::rules::IgnoreRuleSet;
use crate::tree::sort_entries;
use crate::walker::ListedFile;

/// A source set together with the ignore rules it contributed.
#[derive(Debug, Clone)]
struct RuledSource {
    files: SourceSet,
    rules: Vec<String>,
}

/// Aggregation state for one user session.
#[derive(Debug)]
pub struct Session {
    sources: Sources,
    directory: Option<RuledSource>,
    archive: Option<RuledSource>,
    individual: SourceSet,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            sources: Sources::new(),
            directory: None,
            archive: None,
            individual: SourceSet::new(SourceKind::Individual),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory source with a fresh listing.
    ///
    /// Locators of the previous directory source are released; entries
    /// still holding them fail to resolve.
    pub fn select_directory(&mut self, listing: Vec<ListedFile>) -> &SourceSet {
        self.release_directory();

        let mut files = SourceSet::new(SourceKind::Directory);
        let mut rules = IgnoreRuleSet::empty();
        for listed in listing {
            if let Some(content) = &listed.gitignore {
                rules.add_gitignore(&listed.relative_path, content);
            }
            let id = self.sources.resources().register(listed.resource);
            files.push(&listed.relative_path, Locator::Resource(id));
        }
        debug!(
            "directory source selected: {} files, {} ignore rules",
            files.len(),
            rules.len()
        );

        let source = self.directory.insert(RuledSource {
            files,
            rules: rules.rules().to_vec(),
        });
        &source.files
    }

    /// Replace the archive source with a freshly decoded archive.
    ///
    /// The previous archive index is dropped; entries still pointing into it
    /// fail to resolve.
    pub fn select_archive(&mut self, contents: ArchiveContents) -> &SourceSet {
        let ArchiveContents {
            entries,
            index,
            gitignore_rules,
        } = contents;
        let generation = self.sources.archive().install(index);

        let mut files = SourceSet::new(SourceKind::Archive);
        for path in entries {
            let locator = Locator::Archive {
                generation,
                key: path.clone(),
            };
            files.push(&path, locator);
        }
        debug!(
            "archive source selected: {} files, {} ignore rules (generation {})",
            files.len(),
            gitignore_rules.len(),
            generation
        );

        let source = self.archive.insert(RuledSource {
            files,
            rules: gitignore_rules,
        });
        &source.files
    }

    /// Add one individually picked file, keyed by `name`.
    pub fn add_file(&mut self, name: impl AsRef<str>, resource: Resource) {
        let id = self.sources.resources().register(resource);
        self.individual.push(name, Locator::Resource(id));
    }

    /// Add individually picked files.
    pub fn add_files<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = ListedFile>,
    {
        for file in files {
            self.add_file(&file.relative_path, file.resource);
        }
    }

    /// Drop the directory source and release its locators.
    pub fn clear_directory(&mut self) {
        self.release_directory();
    }

    /// Drop the archive source and its index.
    pub fn clear_archive(&mut self) {
        self.archive = None;
        self.sources.archive().clear();
    }

    fn release_directory(&mut self) {
        if let Some(previous) = self.directory.take() {
            let released = self
                .sources
                .resources()
                .release_all(previous.files.resource_ids());
            debug!("directory source replaced: {} locators released", released);
        }
    }

    pub fn directory(&self) -> Option<&SourceSet> {
        self.directory.as_ref().map(|s| &s.files)
    }

    pub fn archive(&self) -> Option<&SourceSet> {
        self.archive.as_ref().map(|s| &s.files)
    }

    pub fn individual(&self) -> &SourceSet {
        &self.individual
    }

    /// Shared retrieval state. Clones resolve against live state.
    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Active ignore rules: defaults, then directory rules, then archive rules.
    pub fn rules(&self) -> IgnoreRuleSet {
        let mut rules = IgnoreRuleSet::new();
        for source in self.directory.iter().chain(self.archive.iter()) {
            rules.extend(source.rules.iter().cloned());
        }
        rules
    }

    /// Merge the active sources: directory, then archive, then individual files.
    pub fn merged(&self) -> MergedTree {
        let sets = self
            .directory
            .iter()
            .chain(self.archive.iter())
            .map(|s| &s.files)
            .chain(std::iter::once(&self.individual));
        merge_all(sets)
    }

    /// Filtered, sorted entries for display and selection.
    pub fn view(&self, criteria: &FilterCriteria) -> Vec<Entry> {
        sort_entries(filter(&self.merged(), &self.rules(), criteria))
    }

    /// Pick the entries named by `paths` out of `view`, in `paths` order.
    ///
    /// Unknown paths are skipped. An empty result is an error.
    pub fn select<S: AsRef<str>>(view: &[Entry], paths: &[S]) -> Result<Vec<Entry>, CollateError> {
        let selected: Vec<Entry> = paths
            .iter()
            .filter_map(|path| {
                let path = path.as_ref();
                let found = view.iter().find(|e| e.path == path);
                if found.is_none() {
                    debug!("selected path {} is not in the current view", path);
                }
                found.cloned()
            })
            .collect();

        if selected.is_empty() {
            return Err(CollateError::EmptySelection);
        }
        Ok(selected)
    }

    /// Resolve selected entries to text.
    pub fn resolve(&self, selected: &[Entry]) -> Result<Vec<FileContent>, CollateError> {
        resolve(selected, &self.sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::list_directory;
    use std::fs;
    use tempfile::TempDir;

    fn listed(path: &str, content: &str) -> ListedFile {
        ListedFile {
            relative_path: path.to_string(),
            resource: Resource::bytes(content),
            gitignore: path.ends_with(".gitignore").then(|| content.to_string()),
        }
    }

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_directory_gitignore_rules_apply() {
        let mut session = Session::new();
        session.select_directory(vec![
            listed("p/.gitignore", "*.log\n# comment\nbuild/\n"),
            listed("p/src/main.rs", "fn main() {}"),
            listed("p/app.log", "noise"),
            listed("p/build/out.txt", "artifact"),
            listed("p/.git/HEAD", "ref"),
        ]);

        let view = session.view(&FilterCriteria::new());
        assert_eq!(paths(&view), vec!["p/.gitignore", "p/src/main.rs"]);
        assert_eq!(
            session.rules().rules(),
            &[
                ".git/**".to_string(),
                "p/*.log".to_string(),
                "p/build/".to_string(),
            ]
        );
    }

    #[test]
    fn test_directory_wins_over_archive_and_individual() {
        let mut session = Session::new();
        session.add_file("shared.txt", Resource::bytes("individual"));
        session.select_archive(ArchiveContents::new().with_file("shared.txt", "archive"));
        session.select_directory(vec![listed("shared.txt", "directory")]);

        let view = session.view(&FilterCriteria::new());
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].source, SourceKind::Directory);

        let files = session.resolve(&view).unwrap();
        assert_eq!(files[0].text, "directory");
    }

    #[test]
    fn test_individual_files_accumulate() {
        let mut session = Session::new();
        session.add_file("a.txt", Resource::bytes("a"));
        session.select_directory(vec![listed("d/x.rs", "x")]);
        session.add_file("b.txt", Resource::bytes("b"));
        session.select_directory(vec![listed("e/y.rs", "y")]);

        assert_eq!(session.individual().len(), 2);
        let view = session.view(&FilterCriteria::new());
        assert_eq!(paths(&view), vec!["a.txt", "b.txt", "e/y.rs"]);
    }

    #[test]
    fn test_replacing_directory_invalidates_old_entries() {
        let mut session = Session::new();
        session.select_directory(vec![listed("old/a.txt", "old")]);
        let stale = session.view(&FilterCriteria::new());

        session.select_directory(vec![listed("new/b.txt", "new")]);
        assert_eq!(session.sources().resources().live_count(), 1);

        let err = session.resolve(&stale).unwrap_err();
        assert!(err.is_source_replaced());
    }

    #[test]
    fn test_replacing_archive_invalidates_old_entries() {
        let mut session = Session::new();
        session.select_archive(ArchiveContents::new().with_file("a.txt", "first"));
        let stale = session.view(&FilterCriteria::new());

        session.select_archive(ArchiveContents::new().with_file("a.txt", "second"));
        assert!(session.resolve(&stale).unwrap_err().is_source_replaced());

        let fresh = session.view(&FilterCriteria::new());
        assert_eq!(session.resolve(&fresh).unwrap()[0].text, "second");
    }

    #[test]
    fn test_archive_rules_apply() {
        let mut session = Session::new();
        session.select_archive(
            ArchiveContents::new()
                .with_file("r/keep.rs", "k")
                .with_file("r/tmp/skip.rs", "s")
                .with_rule("r/tmp/"),
        );
        let view = session.view(&FilterCriteria::new());
        assert_eq!(paths(&view), vec!["r/keep.rs"]);
    }

    #[test]
    fn test_nested_negated_rule_is_skipped() {
        let mut session = Session::new();
        session.select_directory(vec![
            listed("p/.gitignore", "!keep.log\n"),
            listed("p/a.rs", "a"),
        ]);

        let matcher = session.rules().matcher();
        assert_eq!(matcher.rules().len(), 1);
        assert_eq!(matcher.skipped(), 1);
        assert_eq!(paths(&session.view(&FilterCriteria::new())), vec!["p/.gitignore", "p/a.rs"]);
    }

    #[test]
    fn test_rooted_listing_paths_rebase_rules() {
        let mut session = Session::new();
        session.select_directory(vec![
            listed("/p/.gitignore", "/dist\n"),
            listed("/p/a.rs", "a"),
            listed("/p/dist/out.js", "bundle"),
        ]);

        let view = session.view(&FilterCriteria::new());
        assert_eq!(paths(&view), vec!["p/.gitignore", "p/a.rs"]);
    }

    #[test]
    fn test_clear_sources() {
        let mut session = Session::new();
        session.select_directory(vec![listed("d/a", "a")]);
        session.select_archive(ArchiveContents::new().with_file("z/b", "b"));

        session.clear_directory();
        session.clear_archive();

        assert!(session.directory().is_none());
        assert!(session.archive().is_none());
        assert!(session.merged().is_empty());
        assert_eq!(session.sources().resources().live_count(), 0);
        assert_eq!(session.sources().archive().generation(), None);
    }

    #[test]
    fn test_view_applies_criteria() {
        let mut session = Session::new();
        session.select_archive(
            ArchiveContents::new()
                .with_file("a.txt", "")
                .with_file("x/b.txt", "")
                .with_file("x/y/c.txt", "")
                .with_file("x/b.test.txt", ""),
        );

        let criteria = FilterCriteria::new().with_max_depth(2).excluding(["test"]);
        assert_eq!(paths(&session.view(&criteria)), vec!["a.txt", "x/b.txt"]);
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let mut session = Session::new();
        session.select_archive(
            ArchiveContents::new()
                .with_file("a", "1")
                .with_file("b", "2")
                .with_file("c", "3"),
        );
        let view = session.view(&FilterCriteria::new());

        let selected = Session::select(&view, &["c", "nope", "a"]).unwrap();
        assert_eq!(paths(&selected), vec!["c", "a"]);

        let texts: Vec<_> = session
            .resolve(&selected)
            .unwrap()
            .into_iter()
            .map(|f| f.text)
            .collect();
        assert_eq!(texts, vec!["3", "1"]);
    }

    #[test]
    fn test_select_nothing_is_empty_selection() {
        let view: Vec<Entry> = Vec::new();
        let err = Session::select::<&str>(&view, &[]).unwrap_err();
        assert!(matches!(err, CollateError::EmptySelection));
        assert_eq!(err.to_string(), "no files selected after filtering");
    }

    #[test]
    fn test_session_over_real_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn lib() {}").unwrap();
        fs::write(root.join("secret.env"), "KEY=1").unwrap();
        fs::write(root.join(".gitignore"), "*.env\n").unwrap();

        let mut session = Session::new();
        session.select_directory(list_directory(&root).unwrap());

        let view = session.view(&FilterCriteria::new());
        assert_eq!(paths(&view), vec!["proj/.gitignore", "proj/src/lib.rs"]);

        let selected = Session::select(&view, &["proj/src/lib.rs"]).unwrap();
        let files = session.resolve(&selected).unwrap();
        assert_eq!(files[0].text, "pub fn lib() {}");

        fs::remove_file(root.join("src/lib.rs")).unwrap();
        let err = session.resolve(&selected).unwrap_err();
        assert!(matches!(err, CollateError::Retrieval { ref path, .. } if path == "proj/src/lib.rs"));
    }
}
