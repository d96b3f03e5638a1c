use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;

/// A regular (non-directory) file discovered while scanning a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Base name as found on disk, before any case normalization
    pub name: OsString,
    /// Absolute path of the directory containing the file
    pub directory: PathBuf,
    pub size: u64,
    pub modified_time: Option<SystemTime>,
}

impl FileEntry {
    pub fn from_metadata(name: impl Into<OsString>, directory: PathBuf, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            directory,
            size: metadata.len(),
            modified_time: metadata.modified().ok(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }

    pub fn file_name(&self) -> &OsStr {
        &self.name
    }
}
