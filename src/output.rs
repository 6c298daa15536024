//! Output formatting.
//!
//! Turns views and resolved files into either a plain text document or JSON.

use serde::Serialize;
use thiserror::Error;

use crate::assemble::FileContent;
use crate::entry::{Entry, SourceKind};
use crate::tree::{render_tree, FileNode, RenderOptions};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Directory structure followed by one block per file (default).
    #[default]
    Plain,
    /// JSON for programmatic access.
    Json,
}

/// Options controlling what to include in output.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// Include the directory structure section.
    pub include_tree: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Plain,
            include_tree: true,
        }
    }
}

impl OutputOptions {
    pub fn json() -> Self {
        Self {
            format: OutputFormat::Json,
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct JsonViewEntry<'a> {
    path: &'a str,
    source: SourceKind,
    depth: usize,
}

#[derive(Serialize)]
struct JsonView<'a> {
    total: usize,
    entries: Vec<JsonViewEntry<'a>>,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    total: usize,
    files: &'a [FileContent],
}

/// Format a filtered view for display.
pub fn format_view(entries: &[Entry], format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Plain => {
            let options = RenderOptions {
                show_source: true,
                ..Default::default()
            };
            Ok(render_tree(&FileNode::from_entries(entries), &options))
        }
        OutputFormat::Json => {
            let view = JsonView {
                total: entries.len(),
                entries: entries
                    .iter()
                    .map(|e| JsonViewEntry {
                        path: &e.path,
                        source: e.source,
                        depth: e.depth(),
                    })
                    .collect(),
            };
            Ok(serde_json::to_string_pretty(&view)?)
        }
    }
}

/// Format resolved files into the final document.
pub fn format_document(files: &[FileContent], options: &OutputOptions) -> Result<String, OutputError> {
    match options.format {
        OutputFormat::Plain => Ok(format_document_plain(files, options.include_tree)),
        OutputFormat::Json => {
            let document = JsonDocument {
                total: files.len(),
                files,
            };
            Ok(serde_json::to_string_pretty(&document)?)
        }
    }
}

fn format_document_plain(files: &[FileContent], include_tree: bool) -> String {
    let capacity = files.iter().map(|f| f.text.len() + f.path.len() + 32).sum::<usize>();
    let mut output = String::with_capacity(capacity + 1024);

    if include_tree {
        let root = FileNode::from_paths(files.iter().map(|f| (f.path.as_str(), f.source)));
        output.push_str("Directory Structure:\n\n");
        output.push_str(&render_tree(&root, &RenderOptions::default()));
    }

    for file in files {
        output.push_str("\n---\nFile: ");
        output.push_str(&file.path);
        output.push_str("\n---\n\n");
        output.push_str(&file.text);
        if !file.text.ends_with('\n') {
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Locator;

    fn file(path: &str, text: &str) -> FileContent {
        FileContent {
            path: path.to_string(),
            source: SourceKind::Directory,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_output_options_default() {
        let options = OutputOptions::default();
        assert_eq!(options.format, OutputFormat::Plain);
        assert!(options.include_tree);
    }

    #[test]
    fn test_plain_document() {
        let files = vec![file("p/src/main.rs", "fn main() {}"), file("p/README.md", "# Hi\n")];
        let output = format_document(&files, &OutputOptions::default()).unwrap();

        let expected = "Directory Structure:\n\n\
            └── p/\n    ├── src/\n    │   └── main.rs\n    └── README.md\n\
            \n---\nFile: p/src/main.rs\n---\n\nfn main() {}\n\
            \n---\nFile: p/README.md\n---\n\n# Hi\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_plain_document_without_tree() {
        let options = OutputOptions {
            include_tree: false,
            ..Default::default()
        };
        let output = format_document(&[file("a.txt", "a")], &options).unwrap();
        assert_eq!(output, "\n---\nFile: a.txt\n---\n\na\n");
    }

    #[test]
    fn test_json_document() {
        let files = vec![file("a.txt", "alpha")];
        let output = format_document(&files, &OutputOptions::json()).unwrap();

        let v: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(v["total"], 1);
        assert_eq!(v["files"][0]["path"], "a.txt");
        assert_eq!(v["files"][0]["source"], "directory");
        assert_eq!(v["files"][0]["text"], "alpha");
    }

    #[test]
    fn test_json_view() {
        let entries = vec![Entry::new(
            "x/b.txt",
            SourceKind::Archive,
            Locator::Archive {
                generation: 1,
                key: "x/b.txt".to_string(),
            },
        )];
        let output = format_view(&entries, OutputFormat::Json).unwrap();

        let v: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(v["total"], 1);
        assert_eq!(v["entries"][0]["path"], "x/b.txt");
        assert_eq!(v["entries"][0]["source"], "archive");
        assert_eq!(v["entries"][0]["depth"], 1);
    }

    #[test]
    fn test_plain_view_marks_sources() {
        let entries = vec![Entry::new(
            "notes.md",
            SourceKind::Individual,
            Locator::Archive {
                generation: 1,
                key: "notes.md".to_string(),
            },
        )];
        let output = format_view(&entries, OutputFormat::Plain).unwrap();
        assert_eq!(output, "└── notes.md [file]\n");
    }
}
