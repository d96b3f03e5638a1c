use crate::index::{FileEntry, Index};

/// Entries of `new` whose key is absent from `original`.
///
/// Iteration follows `new`'s order; treat the result as a set.
pub fn diff<'a>(original: &'a Index, new: &'a Index) -> impl Iterator<Item = &'a FileEntry> + 'a {
    new.iter()
        .filter(move |(key, _)| !original.contains_key(key.as_os_str()))
        .map(|(_, entry)| entry)
}
