//! Ignore, depth, and substring filtering.
//!
//! Stages run in a fixed order, each on the previous stage's output:
//! ignore rules, then the depth bound, then substring exclusion.

use std::collections::BTreeSet;

use log::debug;

use crate::entry::Entry;
use crate::merge::MergedTree;
use crate::pattern::IgnoreMatcher;
use crate::rules::IgnoreRuleSet;

/// User-chosen depth and substring filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Exclusive upper bound on path depth. `None` disables the stage.
    pub max_depth: Option<usize>,
    /// Paths containing any of these are dropped.
    pub exclude_substrings: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the depth bound. Zero disables it.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = (depth > 0).then_some(depth);
        self
    }

    /// Add exclude substrings. Empty strings are dropped.
    pub fn excluding<I, S>(mut self, substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_substrings.extend(
            substrings
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty()),
        );
        self
    }

    /// Build criteria from the raw nesting-level and exclude-list inputs.
    pub fn from_inputs(max_depth: &str, excludes: &str) -> Self {
        Self {
            max_depth: parse_max_depth(max_depth),
            exclude_substrings: parse_excludes(excludes),
        }
    }

    fn depth_allows(&self, entry: &Entry) -> bool {
        match self.max_depth {
            Some(max) if max > 0 => entry.depth() < max,
            _ => true,
        }
    }

    fn substrings_allow(&self, entry: &Entry) -> bool {
        !self
            .exclude_substrings
            .iter()
            .filter(|s| !s.is_empty())
            .any(|s| entry.path.contains(s.as_str()))
    }
}

/// Parse a nesting-level input. Blank, non-numeric, or zero means no bound.
pub fn parse_max_depth(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok().filter(|&d| d > 0)
}

/// Parse a comma-separated exclude list, trimming items and dropping empties.
pub fn parse_excludes(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Filter a merged tree.
pub fn filter(tree: &MergedTree, rules: &IgnoreRuleSet, criteria: &FilterCriteria) -> Vec<Entry> {
    filter_entries(tree.iter().cloned(), &rules.matcher(), criteria)
}

/// Filter entries with an already compiled matcher.
pub fn filter_entries<I>(entries: I, matcher: &IgnoreMatcher, criteria: &FilterCriteria) -> Vec<Entry>
where
    I: IntoIterator<Item = Entry>,
{
    let entries: Vec<Entry> = entries.into_iter().collect();
    let total = entries.len();

    let kept: Vec<Entry> = entries
        .into_iter()
        .filter(|e| !matcher.is_ignored(&e.path))
        .collect();
    let after_ignore = kept.len();

    let kept: Vec<Entry> = kept.into_iter().filter(|e| criteria.depth_allows(e)).collect();
    let after_depth = kept.len();

    let kept: Vec<Entry> = if criteria.exclude_substrings.is_empty() {
        kept
    } else {
        kept.into_iter()
            .filter(|e| criteria.substrings_allow(e))
            .collect()
    };

    debug!(
        "filter: {} entries, {} after ignore rules, {} after depth, {} after excludes",
        total,
        after_ignore,
        after_depth,
        kept.len()
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Locator, SourceKind, SourceSet};

    fn tree(paths: &[&str]) -> MergedTree {
        let mut set = SourceSet::new(SourceKind::Archive);
        for path in paths {
            set.push(
                path,
                Locator::Archive {
                    generation: 1,
                    key: path.to_string(),
                },
            );
        }
        MergedTree::from(&set)
    }

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_ignore_stage() {
        let rules = {
            let mut r = IgnoreRuleSet::new();
            r.push("*.log");
            r.push("build/");
            r
        };
        let t = tree(&[
            "a.log",
            "dir/a.log",
            "a.logx",
            "build/out.txt",
            "buildx/out.txt",
            ".git/HEAD",
        ]);

        let kept = filter(&t, &rules, &FilterCriteria::new());
        assert_eq!(paths(&kept), vec!["a.logx", "buildx/out.txt"]);
    }

    #[test]
    fn test_depth_stage() {
        let t = tree(&["a.txt", "x/b.txt", "x/y/c.txt"]);
        let criteria = FilterCriteria::new().with_max_depth(2);

        let kept = filter(&t, &IgnoreRuleSet::empty(), &criteria);
        assert_eq!(paths(&kept), vec!["a.txt", "x/b.txt"]);
    }

    #[test]
    fn test_zero_depth_disables_stage() {
        let t = tree(&["a.txt", "x/y/z/c.txt"]);
        let criteria = FilterCriteria::new().with_max_depth(0);
        assert_eq!(criteria.max_depth, None);

        let kept = filter(&t, &IgnoreRuleSet::empty(), &criteria);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_substring_stage() {
        let t = tree(&["src/a.ts", "src/a.test.ts"]);
        let criteria = FilterCriteria::new().excluding(["test"]);

        let kept = filter(&t, &IgnoreRuleSet::empty(), &criteria);
        assert_eq!(paths(&kept), vec!["src/a.ts"]);
    }

    #[test]
    fn test_substring_matches_full_path() {
        let t = tree(&["fixtures/data.json", "src/fixtures.rs", "src/main.rs"]);
        let criteria = FilterCriteria::new().excluding(["fixtures"]);

        let kept = filter(&t, &IgnoreRuleSet::empty(), &criteria);
        assert_eq!(paths(&kept), vec!["src/main.rs"]);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let t = tree(&["a.log"]);
        let mut rules = IgnoreRuleSet::empty();
        rules.push("*");

        assert!(filter(&t, &rules, &FilterCriteria::new()).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let t = tree(&[
            "p/.git/config",
            "p/src/lib.rs",
            "p/src/lib.test.rs",
            "p/a/b/c/deep.rs",
            "p/debug.log",
            "p/README.md",
        ]);
        let mut rules = IgnoreRuleSet::new();
        rules.push("*.log");
        let criteria = FilterCriteria::new().with_max_depth(3).excluding(["test"]);

        let once = filter(&t, &rules, &criteria);
        let twice = filter_entries(once.clone(), &rules.matcher(), &criteria);
        assert_eq!(once, twice);
        assert_eq!(paths(&once), vec!["p/src/lib.rs", "p/README.md"]);
    }

    #[test]
    fn test_excluding_drops_empty_strings() {
        let criteria = FilterCriteria::new().excluding(["", "tmp"]);
        assert_eq!(criteria.exclude_substrings.len(), 1);
    }

    #[test]
    fn test_empty_substring_inserted_directly_is_ignored() {
        let mut criteria = FilterCriteria::new().excluding(["test"]);
        criteria.exclude_substrings.insert(String::new());

        let kept = filter(&tree(&["a.rs", "a.test.rs"]), &IgnoreRuleSet::empty(), &criteria);
        assert_eq!(paths(&kept), vec!["a.rs"]);
    }

    #[test]
    fn test_parse_max_depth() {
        assert_eq!(parse_max_depth("3"), Some(3));
        assert_eq!(parse_max_depth(" 2 "), Some(2));
        assert_eq!(parse_max_depth(""), None);
        assert_eq!(parse_max_depth("0"), None);
        assert_eq!(parse_max_depth("-1"), None);
        assert_eq!(parse_max_depth("deep"), None);
    }

    #[test]
    fn test_parse_excludes() {
        let parsed = parse_excludes(" test, node_modules ,, .min.");
        let expected: BTreeSet<String> = ["test", "node_modules", ".min."]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(parsed, expected);
        assert!(parse_excludes("").is_empty());
    }

    #[test]
    fn test_from_inputs() {
        let criteria = FilterCriteria::from_inputs("4", "spec");
        assert_eq!(criteria.max_depth, Some(4));
        assert!(criteria.exclude_substrings.contains("spec"));
    }
}
