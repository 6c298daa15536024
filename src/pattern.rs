//! Gitignore-style rule compilation.
//!
//! Each rule is lexed into a small token form, then matched against paths
//! with a position-set simulation. Matching semantics are a simplified
//! gitignore dialect:
//!
//! - `*` matches any run of characters, including `/`.
//! - `?` matches exactly one character.
//! - `[abc]`, `[a-z]` and `[!x]` are character classes.
//! - `.` and every other character is literal. `\` escapes the next character.
//! - A trailing `/` marks a directory rule: it matches the directory itself
//!   and everything below it.
//! - A leading `/` anchors the rule to the start of the path. Otherwise the
//!   rule may start at any path segment boundary.
//!
//! A match must end at the end of the path or just before a `/`, so `*.log`
//! does not match `a.logx` and `build/` does not match `buildx/out.txt`.
//!
//! Negation (`!pattern`) is not supported. Such rules fail to compile and are
//! skipped like any other invalid rule.

use log::warn;
use thiserror::Error;

/// Reasons a single rule fails to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("negated rules are not supported")]
    Negation,

    #[error("unterminated character class at offset {0}")]
    UnterminatedClass(usize),

    #[error("reversed range `{0}-{1}` in character class")]
    ReversedRange(char, char),

    #[error("trailing backslash")]
    DanglingEscape,
}

/// A set of characters matched by `[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub negated: bool,
    /// Inclusive ranges. Single characters are stored as `(c, c)`.
    pub ranges: Vec<(char, char)>,
}

impl CharClass {
    pub fn matches(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        hit != self.negated
    }
}

/// Intermediate form of a rule body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(char),
    /// `*`
    AnyRun,
    /// `?`
    AnyOne,
    Class(CharClass),
}

impl Token {
    fn matches_char(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyOne => true,
            Token::Class(class) => class.matches(c),
            Token::AnyRun => true,
        }
    }
}

/// Lex a rule body (flags already stripped) into tokens.
pub fn lex(body: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Runs of stars collapse: `**` behaves like `*`.
                if tokens.last() != Some(&Token::AnyRun) {
                    tokens.push(Token::AnyRun);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyOne);
                i += 1;
            }
            '\\' => {
                let escaped = *chars.get(i + 1).ok_or(PatternError::DanglingEscape)?;
                tokens.push(Token::Literal(escaped));
                i += 2;
            }
            '[' => {
                let (class, next) = lex_class(&chars, i)?;
                tokens.push(Token::Class(class));
                i = next;
            }
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Lex a character class starting at `chars[start] == '['`.
/// Returns the class and the index just past the closing `]`.
fn lex_class(chars: &[char], start: usize) -> Result<(CharClass, usize), PatternError> {
    let mut i = start + 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let c = *chars.get(i).ok_or(PatternError::UnterminatedClass(start))?;
        if c == ']' && !first {
            return Ok((CharClass { negated, ranges }, i + 1));
        }
        first = false;

        let lo = if c == '\\' {
            i += 1;
            *chars.get(i).ok_or(PatternError::UnterminatedClass(start))?
        } else {
            c
        };

        // `a-z`, but a `-` right before `]` is literal.
        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|&n| n != ']') {
            let hi = chars[i + 2];
            if hi < lo {
                return Err(PatternError::ReversedRange(lo, hi));
            }
            ranges.push((lo, hi));
            i += 3;
        } else {
            ranges.push((lo, lo));
            i += 1;
        }
    }
}

/// One compiled ignore rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    source: String,
    tokens: Vec<Token>,
    anchored: bool,
    directory: bool,
}

impl Rule {
    /// Compile a raw rule string.
    pub fn compile(rule: &str) -> Result<Self, PatternError> {
        if rule.starts_with('!') {
            return Err(PatternError::Negation);
        }

        let mut body = rule;
        let directory = body.ends_with('/');
        if directory {
            body = &body[..body.len() - 1];
        }
        let anchored = body.starts_with('/');
        if anchored {
            body = &body[1..];
        }
        if body.is_empty() {
            return Err(PatternError::Empty);
        }

        Ok(Self {
            source: rule.to_string(),
            tokens: lex(body)?,
            anchored,
            directory,
        })
    }

    /// The rule as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// Check whether the rule matches `path`.
    pub fn is_match(&self, path: &str) -> bool {
        let chars: Vec<char> = path.chars().collect();
        let n = chars.len();

        // Positions the next token may start at.
        let mut live = vec![false; n + 1];
        live[0] = true;
        if !self.anchored {
            for (i, &c) in chars.iter().enumerate() {
                if c == '/' {
                    live[i + 1] = true;
                }
            }
        }

        for token in &self.tokens {
            let mut next = vec![false; n + 1];
            match token {
                Token::AnyRun => {
                    if let Some(min) = live.iter().position(|&l| l) {
                        next[min..].iter_mut().for_each(|p| *p = true);
                    }
                }
                _ => {
                    for p in 0..n {
                        if live[p] && token.matches_char(chars[p]) {
                            next[p + 1] = true;
                        }
                    }
                }
            }
            if !next.iter().any(|&l| l) {
                return false;
            }
            live = next;
        }

        (0..=n).any(|p| live[p] && (p == n || chars[p] == '/'))
    }
}

/// Compiled form of an ordered rule list.
///
/// Rules that fail to compile are logged and skipped; they never match.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    rules: Vec<Rule>,
    skipped: usize,
}

impl IgnoreMatcher {
    pub fn compile<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for raw in rules {
            let raw = raw.as_ref();
            match Rule::compile(raw) {
                Ok(rule) => matcher.rules.push(rule),
                Err(e) => {
                    warn!("skipping ignore rule {:?}: {}", raw, e);
                    matcher.skipped += 1;
                }
            }
        }
        matcher
    }

    /// True if any rule matches.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(path))
    }

    /// Rules that compiled.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules that failed to compile.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Compile rules into a path predicate returning true for ignored paths.
pub fn compile<I, S>(rules: I) -> impl Fn(&str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let matcher = IgnoreMatcher::compile(rules);
    move |path| matcher.is_ignored(path)
}
