//! Collate - Assemble one text document from many file sources.
//!
//! Collate merges a picked directory, a decoded archive, and individually
//! added files into one deduplicated set of entries, filters it with
//! gitignore-style rules plus depth and substring criteria, orders it, and
//! resolves a selection of it to text for formatting.
//!
//! # Quick Start
//!
//! ```no_run
//! use collate::filter::FilterCriteria;
//! use collate::output::{format_document, OutputOptions};
//! use collate::session::Session;
//! use collate::walker::list_directory;
//!
//! let mut session = Session::new();
//! session.select_directory(list_directory("./my-project".as_ref()).unwrap());
//!
//! let view = session.view(&FilterCriteria::new().with_max_depth(4).excluding(["test"]));
//! let paths: Vec<&str> = view.iter().map(|e| e.path.as_str()).collect();
//! let selected = collate::session::Session::select(&view, &paths).unwrap();
//!
//! let files = session.resolve(&selected).unwrap();
//! println!("{}", format_document(&files, &OutputOptions::default()).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`entry`] - Entries, source kinds, locators, source sets
//! - [`pattern`] - Gitignore-style rule compilation
//! - [`rules`] - Ignore rule sets and `.gitignore` discovery
//! - [`merge`] - Deduplicating merge of source sets
//! - [`filter`] - Ignore, depth, and substring filtering
//! - [`tree`] - Canonical ordering and tree rendering
//! - [`resource`] - Locator registry and archive index
//! - [`assemble`] - Concurrent content resolution
//! - [`session`] - Aggregation state and workflow operations
//! - [`walker`] - Directory enumeration
//! - [`archive`] - Zip archive decoding
//! - [`output`] - Plain and JSON output
//!
//! # Limitations
//!
//! Negated gitignore rules (`!pattern`) are not supported. They are logged
//! and skipped.

pub mod entry;
pub mod pattern;
pub mod rules;
pub mod merge;
pub mod filter;
pub mod tree;
pub mod resource;
pub mod assemble;
pub mod session;
pub mod walker;
pub mod archive;
pub mod output;
pub mod errors;

// Re-export key types at crate root for convenience
pub use archive::ArchiveError;
pub use assemble::{resolve, FileContent};
pub use entry::{Entry, Locator, SourceKind, SourceSet};
pub use errors::CollateError;
pub use filter::FilterCriteria;
pub use merge::MergedTree;
pub use output::OutputError;
pub use pattern::{IgnoreMatcher, PatternError};
pub use resource::{ArchiveContents, ContentSource, Resource, RetrievalError};
pub use rules::IgnoreRuleSet;
pub use session::Session;
pub use walker::WalkError;
