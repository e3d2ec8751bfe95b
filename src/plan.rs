//! The match engine: decides which RAW originals a material folder is missing.
//!
//! For one folder at a time, every compressed preview is paired with at most
//! one RAW file from the camera index:
//!
//! ```text
//! for each compressed file (listing order):
//!     base name already has a RAW here?     → skip
//!     no camera candidate with this name?   → skip   (no metadata I/O yet)
//!     own identity incomplete?              → skip, report as unreadable
//!     first candidate whose identity matches → plan copy, mark name as present
//!     no candidate matches                  → skip   (different capture)
//! ```
//!
//! The candidate search stops at the first match. It is deliberately not a
//! best-match search: candidates are compared in index order and the rest
//! are never read. The set of names considered "present" grows as copies are
//! planned, so a name is never planned twice in one folder.

use crate::formats::{ExtensionClass, FormatTable, base_name_key};
use crate::identity::IdentityReader;
use crate::index::RawIndex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A RAW file waiting to be copied next to its preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// The engine's verdict for one material folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPlan {
    /// Copies to perform, in the order the previews were listed.
    pub copies: Vec<PendingCopy>,
    /// Previews that had a camera candidate but no complete identity.
    pub unreadable: Vec<PathBuf>,
}

impl FolderPlan {
    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }
}

/// Plan the RAW copies for a single folder.
///
/// `files` are the names (or paths) of the files directly inside `folder`,
/// in listing order. Only their file names are used; each is resolved
/// against `folder`.
pub fn plan_copies<R: IdentityReader + ?Sized>(
    folder: &Path,
    files: &[PathBuf],
    index: &RawIndex,
    formats: &FormatTable,
    reader: &R,
) -> FolderPlan {
    let mut compressed = Vec::new();
    let mut present: HashSet<String> = HashSet::new();

    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let Some(key) = base_name_key(name) else {
            continue;
        };
        match formats.classify(name) {
            ExtensionClass::Compressed => compressed.push((folder.join(name), key)),
            ExtensionClass::Raw => {
                present.insert(key);
            }
            ExtensionClass::Unrecognized => {}
        }
    }

    let mut plan = FolderPlan::default();

    for (preview, key) in compressed {
        if present.contains(&key) {
            log::trace!("{} already has a RAW", preview.display());
            continue;
        }
        let candidates = index.candidates(&key);
        if candidates.is_empty() {
            continue;
        }

        let identity = reader.read_identity(&preview);
        if !identity.is_complete() {
            log::warn!(
                "cannot read capture identity of {}, skipping",
                preview.display()
            );
            plan.unreadable.push(preview);
            continue;
        }

        let found = candidates.iter().find(|candidate| {
            let matched = reader.read_identity(candidate).matches(&identity);
            log::debug!(
                "{} vs {}: {}",
                preview.display(),
                candidate.display(),
                if matched { "match" } else { "different capture" }
            );
            matched
        });

        let Some(source) = found else {
            log::debug!(
                "no candidate among {} matches {}",
                candidates.len(),
                preview.display()
            );
            continue;
        };
        let Some(raw_name) = source.file_name() else {
            continue;
        };
        plan.copies.push(PendingCopy {
            source: source.clone(),
            destination: folder.join(raw_name),
        });
        present.insert(key);
    }

    plan
}
