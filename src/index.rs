//! Base-name index of the files on camera storage.
//!
//! The index maps a case-insensitive base name (`img_0001`) to every file of
//! the requested class that carries it, in the order the walk found them:
//!
//! ```text
//! DCIM/100CANON/IMG_0001.CR2 ─┐
//! DCIM/101CANON/IMG_0001.DNG ─┼─▶ "img_0001" → [100CANON/IMG_0001.CR2,
//! E:/DCIM/100CANON/IMG_0001.CR2┘                 101CANON/IMG_0001.DNG,
//!                                                E:/.../IMG_0001.CR2]
//! ```
//!
//! Nothing is dropped on collision: the match engine needs every candidate
//! and uses the order to break ties. Within a directory, entries are walked
//! in file-name order so that order is reproducible across runs and
//! platforms.

use crate::formats::{ExtensionClass, FormatTable, base_name_key};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One-to-many map from lowercased base name to file paths.
#[derive(Debug, Default, Clone)]
pub struct RawIndex {
    entries: HashMap<String, Vec<PathBuf>>,
    file_count: usize,
}

impl RawIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a path under its base name. Paths without a stem are ignored.
    pub fn insert(&mut self, path: PathBuf) {
        let Some(key) = base_name_key(&path) else {
            return;
        };
        self.entries.entry(key).or_default().push(path);
        self.file_count += 1;
    }

    /// Merge another index after this one. Candidates from `other` go after
    /// the ones already present for the same base name.
    pub fn extend(&mut self, other: RawIndex) {
        for (key, paths) in other.entries {
            self.entries.entry(key).or_default().extend(paths);
        }
        self.file_count += other.file_count;
    }

    /// Candidates for a base name, in discovery order. The lookup is
    /// case-insensitive.
    pub fn candidates(&self, base_name: &str) -> &[PathBuf] {
        self.entries
            .get(&base_name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, base_name: &str) -> bool {
        !self.candidates(base_name).is_empty()
    }

    /// Number of distinct base names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of indexed files, counting every same-named variant.
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk `root` recursively and index every file of `class`.
///
/// Unreadable entries (permission denied, entries vanishing mid-walk) are
/// logged and skipped; a partial index is more useful than none.
pub fn build_index(root: &Path, class: ExtensionClass, formats: &FormatTable) -> RawIndex {
    let mut index = RawIndex::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if formats.classify(entry.path()) == class {
            log::trace!("indexed {}", entry.path().display());
            index.insert(entry.into_path());
        }
    }

    index
}
