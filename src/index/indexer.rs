use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use derive_more::Deref;
use hashlink::LinkedHashMap;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use super::FileEntry;

/// Settings threaded through a single tree scan
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Uppercase names before using them as index keys
    pub case_insensitive: bool,
    /// Log every directory before its contents are read
    pub verbose: bool,
}

impl ScanOptions {
    /// Keys keep the raw name bytes. In case-insensitive mode UTF-8 names are
    /// uppercased one char at a time (`ß` stays `ß`); other names only have
    /// their ASCII letters uppercased.
    pub fn index_key(&self, name: &OsStr) -> OsString {
        if !self.case_insensitive {
            return name.to_os_string();
        }
        match name.to_str() {
            Some(name) => name.chars().map(simple_uppercase).collect::<String>().into(),
            None => name.to_ascii_uppercase(),
        }
    }
}

/// One-to-one uppercase mapping; chars whose uppercase form expands to
/// several chars are left as they are
fn simple_uppercase(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Name-keyed view of every file below one root, in traversal order.
///
/// Keys are unique. When two files in different directories map to the same
/// key, the one visited last replaces the earlier entry.
#[derive(Debug, Clone, Default, Deref)]
pub struct Index {
    entries: LinkedHashMap<OsString, FileEntry>,
}

impl Index {
    /// Inserts an entry, returning the one it replaced
    pub fn insert(&mut self, key: OsString, entry: FileEntry) -> Option<FileEntry> {
        self.entries.insert(key, entry)
    }
}

/// Recursively scans `root` depth-first and indexes every non-directory entry.
///
/// Any directory that cannot be listed aborts the whole scan.
pub fn index_tree(root: &Path, options: &ScanOptions) -> Result<Index, IndexError> {
    let mut index = Index::default();
    visit(root, options, &mut index)?;
    debug!("Indexed {} files under {}", index.len(), root.display());
    Ok(index)
}

fn visit(dir: &Path, options: &ScanOptions, index: &mut Index) -> Result<(), IndexError> {
    if options.verbose {
        info!("Checking directory {}", dir.display());
    }

    // Read the listing up front so the handle is closed before recursing
    let entries = fs::read_dir(dir)
        .context(ReadDirSnafu {
            path: dir.to_path_buf(),
        })?
        .collect::<Result<Vec<_>, _>>()
        .context(ReadEntrySnafu {
            path: dir.to_path_buf(),
        })?;

    for entry in entries {
        let file_type = entry
            .file_type()
            .context(MetadataSnafu { path: entry.path() })?;

        if file_type.is_dir() {
            visit(&entry.path(), options, index)?;
            continue;
        }

        let metadata = entry
            .metadata()
            .context(MetadataSnafu { path: entry.path() })?;
        let file_entry = FileEntry::from_metadata(entry.file_name(), dir.to_path_buf(), &metadata);
        let key = options.index_key(file_entry.file_name());

        if let Some(replaced) = index.insert(key, file_entry) {
            debug!(
                "Name collision for '{}': {} replaces {}",
                replaced.name.to_string_lossy(),
                dir.display(),
                replaced.directory.display()
            );
        }
    }

    Ok(())
}

#[derive(Debug, Snafu)]
pub enum IndexError {
    #[snafu(display("Failed to open directory {}", path.display()))]
    ReadDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to list directory {}", path.display()))]
    ReadEntryError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read metadata of {}", path.display()))]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },
}
