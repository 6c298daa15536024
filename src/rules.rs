//! Ignore rule sets and `.gitignore` discovery.

use log::debug;

use crate::entry::normalize_path;
use crate::pattern::IgnoreMatcher;

/// Rules present in every rule set: version-control metadata.
pub const DEFAULT_RULES: &[&str] = &[".git/**"];

/// File name that contributes rules when found inside a source.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Ordered raw rule strings in gitignore syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRuleSet {
    rules: Vec<String>,
}

impl Default for IgnoreRuleSet {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl IgnoreRuleSet {
    /// Create a rule set seeded with [`DEFAULT_RULES`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule set with no rules at all.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: impl Into<String>) {
        self.rules.push(rule.into());
    }

    pub fn extend<I, S>(&mut self, rules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(rules.into_iter().map(Into::into));
    }

    /// Add the rules of a `.gitignore` located at `gitignore_path`,
    /// rewritten relative to the directory containing it.
    ///
    /// Returns the number of rules added.
    pub fn add_gitignore(&mut self, gitignore_path: &str, content: &str) -> usize {
        let gitignore_path = normalize_path(gitignore_path);
        let dir = parent_dir(&gitignore_path);
        let before = self.rules.len();
        self.rules
            .extend(parse_gitignore(content).map(|line| rebase_rule(dir, line)));
        let added = self.rules.len() - before;
        debug!("{}: {} ignore rules", gitignore_path, added);
        added
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compile the rules into a matcher.
    pub fn matcher(&self) -> IgnoreMatcher {
        IgnoreMatcher::compile(&self.rules)
    }
}

/// Rule lines of a `.gitignore`: trimmed, without blanks or `#` comments.
pub fn parse_gitignore(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Make `rule` relative to `dir`. Anchored rules stay anchored.
///
/// Negated rules are kept as written so they still fail to compile.
pub fn rebase_rule(dir: &str, rule: &str) -> String {
    if dir.is_empty() || rule.starts_with('!') {
        return rule.to_string();
    }
    match rule.strip_prefix('/') {
        Some(rest) => format!("/{}/{}", dir, rest),
        None => format!("{}/{}", dir, rule),
    }
}

/// True if `path` names a `.gitignore` file.
pub fn is_gitignore(path: &str) -> bool {
    path.rsplit('/').next() == Some(GITIGNORE_FILE)
}

fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed() {
        let rules = IgnoreRuleSet::new();
        assert_eq!(rules.rules(), &[".git/**".to_string()]);
        assert!(IgnoreRuleSet::empty().is_empty());
    }

    #[test]
    fn test_parse_gitignore_skips_comments_and_blanks() {
        let content = "# build output\n\ntarget/\r\n  *.log  \n#*.tmp\n";
        let lines: Vec<_> = parse_gitignore(content).collect();
        assert_eq!(lines, vec!["target/", "*.log"]);
    }

    #[test]
    fn test_rebase_rule() {
        assert_eq!(rebase_rule("", "*.log"), "*.log");
        assert_eq!(rebase_rule("project/web", "dist/"), "project/web/dist/");
        assert_eq!(rebase_rule("project", "/out"), "/project/out");
        assert_eq!(rebase_rule("project", "!keep.log"), "!keep.log");
    }

    #[test]
    fn test_nested_negation_is_skipped() {
        let mut rules = IgnoreRuleSet::new();
        rules.add_gitignore("p/.gitignore", "*.log\n!keep.log\n");
        let matcher = rules.matcher();

        assert_eq!(matcher.rules().len(), 2);
        assert_eq!(matcher.skipped(), 1);
        assert!(matcher.is_ignored("p/keep.log"));
    }

    #[test]
    fn test_gitignore_path_is_normalized() {
        let mut rules = IgnoreRuleSet::new();
        rules.add_gitignore("/p/.gitignore", "/dist\nbuild/\n");

        assert_eq!(
            rules.rules(),
            &[
                ".git/**".to_string(),
                "/p/dist".to_string(),
                "p/build/".to_string(),
            ]
        );
        assert!(rules.matcher().is_ignored("p/dist/out.js"));
    }

    #[test]
    fn test_add_gitignore_rebases_rules() {
        let mut rules = IgnoreRuleSet::new();
        let added = rules.add_gitignore("project/.gitignore", "*.log\n/dist\n");

        assert_eq!(added, 2);
        assert_eq!(
            rules.rules(),
            &[
                ".git/**".to_string(),
                "project/*.log".to_string(),
                "/project/dist".to_string(),
            ]
        );
    }

    #[test]
    fn test_root_gitignore_keeps_rules_verbatim() {
        let mut rules = IgnoreRuleSet::empty();
        rules.add_gitignore(".gitignore", "node_modules/");
        assert_eq!(rules.rules(), &["node_modules/".to_string()]);
    }

    #[test]
    fn test_nested_gitignore_scopes_to_its_directory() {
        let mut rules = IgnoreRuleSet::new();
        rules.add_gitignore("project/web/.gitignore", "/dist\n");
        let matcher = rules.matcher();

        assert!(matcher.is_ignored("project/web/dist/app.js"));
        assert!(!matcher.is_ignored("project/dist/app.js"));
    }

    #[test]
    fn test_is_gitignore() {
        assert!(is_gitignore(".gitignore"));
        assert!(is_gitignore("project/src/.gitignore"));
        assert!(!is_gitignore("project/not.gitignore"));
    }
}
