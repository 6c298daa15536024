//! Directory enumeration.
//!
//! Lists every file below a picked directory, the way a directory picker
//! reports them: relative paths that begin with the directory's own name.
//! No ignore rules are applied here. `.gitignore` contents are captured so
//! the rules can be applied later, together with every other source.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::debug;
use thiserror::Error;

use crate::resource::Resource;
use crate::rules::is_gitignore;

/// Errors that can occur during directory listing.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for directory listing.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Prefix paths with the directory's own name.
    pub include_root_name: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_root_name: true,
        }
    }
}

/// One file reported by a directory listing.
#[derive(Debug, Clone)]
pub struct ListedFile {
    /// Forward-slash relative path.
    pub relative_path: String,
    /// Where the bytes live.
    pub resource: Resource,
    /// Text of the file when it is a `.gitignore`.
    pub gitignore: Option<String>,
}

/// List every file below `root`.
pub fn list_directory(root: &Path) -> Result<Vec<ListedFile>, WalkError> {
    list_directory_with_options(root, &WalkOptions::default())
}

/// List every file below `root` with custom options.
pub fn list_directory_with_options(
    root: &Path,
    options: &WalkOptions,
) -> Result<Vec<ListedFile>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let root_name = if options.include_root_name {
        root_name(root)?
    } else {
        String::new()
    };

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(options.follow_symlinks)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = result.map_err(|e| convert_error(root, e))?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative_path = join_relative(&root_name, relative);

        let gitignore = if is_gitignore(&relative_path) {
            let bytes = std::fs::read(entry.path()).map_err(|e| WalkError::Io {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };

        files.push(ListedFile {
            relative_path,
            resource: Resource::file(entry.path()),
            gitignore,
        });
    }

    debug!("{}: {} files listed", root.display(), files.len());
    Ok(files)
}

/// Describe a single picked file: its name is its path.
pub fn list_file(path: &Path) -> Result<ListedFile, WalkError> {
    if !path.is_file() {
        return Err(WalkError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ListedFile {
        relative_path: name,
        resource: Resource::file(path),
        gitignore: None,
    })
}

fn root_name(root: &Path) -> Result<String, WalkError> {
    if let Some(name) = root.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    // `.` or `..` have no file name of their own.
    let canonical = root.canonicalize().map_err(|e| WalkError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;
    Ok(canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}

fn join_relative(root_name: &str, relative: &Path) -> String {
    let mut joined = root_name.to_string();
    for component in relative.components() {
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(&component.as_os_str().to_string_lossy());
    }
    joined
}

fn convert_error(root: &Path, error: ignore::Error) -> WalkError {
    let path = root.to_path_buf();
    match error.into_io_error() {
        Some(io_err) if io_err.kind() == std::io::ErrorKind::PermissionDenied => {
            WalkError::PermissionDenied { path }
        }
        Some(io_err) => WalkError::Io {
            path,
            source: io_err,
        },
        None => WalkError::Io {
            path,
            source: std::io::Error::other("directory walk failed"),
        },
    }
}
