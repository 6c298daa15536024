//! Zip archive decoding.
//!
//! Reads every file of a zip archive into memory and collects the rules of
//! any `.gitignore` inside it, rebased to the directory that holds it.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::entry::normalize_path;
use crate::resource::ArchiveContents;
use crate::rules::{is_gitignore, IgnoreRuleSet};

/// Errors that can occur while decoding an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid archive: {0}")]
    Zip(#[from] ZipError),

    #[error("IO error reading archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode the zip archive at `path`.
pub fn read_archive(path: &Path) -> Result<ArchiveContents, ArchiveError> {
    if !path.is_file() {
        return Err(ArchiveError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = read_archive_from(BufReader::new(File::open(path)?))?;
    debug!(
        "{}: {} archive entries, {} ignore rules",
        path.display(),
        contents.entries.len(),
        contents.gitignore_rules.len()
    );
    Ok(contents)
}

/// Decode a zip archive from any seekable reader.
///
/// Directory entries are skipped. Paths use forward slashes without a
/// leading `/`.
pub fn read_archive_from<R: Read + Seek>(reader: R) -> Result<ArchiveContents, ArchiveError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut contents = ArchiveContents::new();
    let mut rules = IgnoreRuleSet::empty();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let path = normalize_path(file.name());
        if path.is_empty() {
            continue;
        }

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;

        if is_gitignore(&path) {
            rules.add_gitignore(&path, &String::from_utf8_lossy(&bytes));
        }
        contents = contents.with_file(path, bytes);
    }

    contents.gitignore_rules = rules.rules().to_vec();
    Ok(contents)
}
