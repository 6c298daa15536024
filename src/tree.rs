//! Ordering and tree rendering of entries.
//!
//! Entries are flat files; the tree built here materializes the implicit
//! directories so a selection can be displayed with box-drawing characters.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::entry::{Entry, SourceKind};

/// Canonical entry order: case-sensitive code-point order of the full path.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    a.path.cmp(&b.path)
}

/// Sort entries into canonical order.
pub fn sort_entries(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(compare_entries);
    entries
}

/// The type of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File { source: SourceKind },
}

/// A node in the display tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Final path segment.
    pub name: String,
    /// Path from the root, without a leading `/`.
    pub path: String,
    pub kind: NodeKind,
    children: Vec<FileNode>,
}

impl FileNode {
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>, source: SourceKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File { source },
            children: Vec::new(),
        }
    }

    /// Build a nameless root holding `entries`, with directories made explicit.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        Self::from_paths(entries.into_iter().map(|e| (e.path.as_str(), e.source)))
    }

    /// Build a nameless root from `(path, source)` pairs.
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, SourceKind)>,
    {
        let mut root = FileNode::directory("", "");
        for (path, source) in paths {
            root.insert(path, source);
        }
        root.sort_children();
        root
    }

    fn insert(&mut self, path: &str, source: SourceKind) {
        let segments: Vec<&str> = path.split('/').collect();
        let (file_name, dirs) = match segments.split_last() {
            Some(split) => split,
            None => return,
        };

        let mut node = self;
        let mut prefix = String::new();
        for dir in dirs {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(dir);

            let index = match node
                .children
                .iter()
                .position(|c| c.is_directory() && c.name == *dir)
            {
                Some(i) => i,
                None => {
                    node.children.push(FileNode::directory(*dir, prefix.clone()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        node.children.push(FileNode::file(*file_name, path, source));
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn add_child(&mut self, child: FileNode) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[FileNode] {
        &self.children
    }

    /// Sort children: directories first, then by name (case-sensitive).
    pub fn sort_children(&mut self) {
        self.children.sort_by(|a, b| match (&a.kind, &b.kind) {
            (NodeKind::Directory, NodeKind::File { .. }) => Ordering::Less,
            (NodeKind::File { .. }, NodeKind::Directory) => Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });

        for child in &mut self.children {
            child.sort_children();
        }
    }

    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File { .. } => 1,
            NodeKind::Directory => self.children.iter().map(|c| c.file_count()).sum(),
        }
    }
}

/// Options for rendering the tree.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Append the source kind of each file.
    pub show_source: bool,
    /// Paths marked with `*`.
    pub selected: HashSet<String>,
}

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Render a tree with box-drawing characters.
///
/// A nameless root renders only its children.
///
/// ```
/// use collate::entry::SourceKind;
/// use collate::tree::{FileNode, RenderOptions, render_tree};
///
/// let mut root = FileNode::directory("project", "project");
/// root.add_child(FileNode::file("main.rs", "project/main.rs", SourceKind::Directory));
///
/// let output = render_tree(&root, &RenderOptions::default());
/// assert!(output.contains("└── main.rs"));
/// ```
pub fn render_tree(root: &FileNode, options: &RenderOptions) -> String {
    let mut output = String::with_capacity(4096);
    if root.name.is_empty() {
        render_children(&mut output, root, "", options);
    } else {
        output.push_str(&root.name);
        output.push('/');
        output.push('\n');
        render_children(&mut output, root, "", options);
    }
    output
}

fn render_children(output: &mut String, node: &FileNode, prefix: &str, options: &RenderOptions) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == count;
        render_node(output, child, prefix, is_last, options);
    }
}

fn render_node(
    output: &mut String,
    node: &FileNode,
    prefix: &str,
    is_last: bool,
    options: &RenderOptions,
) {
    output.push_str(prefix);
    output.push_str(if is_last { LAST_BRANCH } else { BRANCH });
    output.push_str(&node.name);

    match &node.kind {
        NodeKind::Directory => output.push('/'),
        NodeKind::File { source } => {
            if options.show_source {
                output.push_str(" [");
                output.push_str(source.label());
                output.push(']');
            }
            if options.selected.contains(&node.path) {
                output.push_str(" *");
            }
        }
    }
    output.push('\n');

    let continuation = if is_last { SPACE } else { VERTICAL };
    let child_prefix = format!("{}{}", prefix, continuation);
    render_children(output, node, &child_prefix, options);
}
