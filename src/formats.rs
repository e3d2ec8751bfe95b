//! Extension classification.
//!
//! Every file the tool looks at is sorted into one of three buckets by its
//! extension alone:
//!
//! - **Compressed**: viewable previews a human filed into the material tree
//!   (`jpg`, `jpeg`, `heic`, `png`, `webp`).
//! - **Raw**: vendor sensor dumps and generic RAW/TIFF containers.
//! - **Unrecognized**: everything else, including files with no extension.
//!   These are ignored by every later stage.
//!
//! The built-in lists are data, not logic. Users can append to them through
//! the `[formats]` section of the config file (see [`crate::config`]).

use std::collections::BTreeSet;
use std::path::Path;

/// Built-in compressed preview extensions (lowercase, no dot).
pub const COMPRESSED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "heic", "png", "webp"];

/// Built-in RAW extensions (lowercase, no dot).
pub const RAW_EXTENSIONS: &[&str] = &[
    "3fr", "arw", "cr2", "cr3", "crw", "dcr", "dng", "erf", "fff", "gpr", "iiq", "kdc", "mef",
    "mos", "mrw", "nef", "nefx", "nrw", "orf", "pef", "raf", "raw", "rw2", "rwl", "srf", "srw",
    "tif", "x3f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionClass {
    Compressed,
    Raw,
    Unrecognized,
}

/// The compressed and RAW extension sets used for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTable {
    compressed: BTreeSet<String>,
    raw: BTreeSet<String>,
}

impl Default for FormatTable {
    fn default() -> Self {
        Self {
            compressed: COMPRESSED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            raw: RAW_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl FormatTable {
    /// Built-in table plus extra extensions. Extras are lowercased; a leading
    /// dot is tolerated here (config validation rejects it earlier).
    pub fn with_extras(extra_compressed: &[String], extra_raw: &[String]) -> Self {
        let mut table = Self::default();
        table
            .compressed
            .extend(extra_compressed.iter().map(|e| normalize_extension(e)));
        table
            .raw
            .extend(extra_raw.iter().map(|e| normalize_extension(e)));
        table
    }

    /// Classify a bare extension (no dot, any case).
    pub fn classify_extension(&self, ext: &str) -> ExtensionClass {
        let ext = normalize_extension(ext);
        if self.compressed.contains(&ext) {
            ExtensionClass::Compressed
        } else if self.raw.contains(&ext) {
            ExtensionClass::Raw
        } else {
            ExtensionClass::Unrecognized
        }
    }

    /// Classify a filename or path by its final extension.
    pub fn classify(&self, path: impl AsRef<Path>) -> ExtensionClass {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) => self.classify_extension(ext),
            None => ExtensionClass::Unrecognized,
        }
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// Case-insensitive correlation key for a file: its stem, lowercased.
///
/// `DCIM/100CANON/IMG_0001.CR2` → `img_0001`. Returns `None` for paths with
/// no file stem (e.g. `..`).
pub fn base_name_key(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
}
