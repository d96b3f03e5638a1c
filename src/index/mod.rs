//! Name-keyed indexing of directory trees.
//!
//! A scan walks one tree depth-first and records every regular file under
//! its (optionally uppercased) base name, regardless of which subdirectory
//! it was found in.

mod file_entry;
mod indexer;

pub use file_entry::FileEntry;
pub use indexer::{Index, IndexError, ScanOptions, index_tree};
