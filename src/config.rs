//! Run configuration.
//!
//! Everything is optional. Without a config file the tool scans `DCIM` on
//! each camera root and recognizes the built-in extension tables.
//!
//! ## Config File Location
//!
//! The file is `raw-backfill.toml` in the material root, or any file passed
//! with `--config`:
//!
//! ```text
//! material/
//! ├── raw-backfill.toml        # optional
//! ├── 2024-spring/
//! │   ├── IMG_0001.JPG
//! │   └── IMG_0001.CR2         # backfilled
//! └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! camera_dir = "DCIM"        # subdirectory scanned on each camera root
//! skip_hidden = true         # skip dot-directories in the material tree
//!
//! [formats]
//! extra_compressed = []      # e.g. ["avif"]
//! extra_raw = []             # e.g. ["bay", "cap"]
//! ```
//!
//! Loading merges the user's file on top of the stock defaults, then rejects
//! unknown keys and validates values, so a typo is an error rather than a
//! silently ignored setting.

use crate::formats::{ExtensionClass, FormatTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the material root.
pub const CONFIG_FILENAME: &str = "raw-backfill.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackfillConfig {
    /// Subdirectory of a camera root that holds the pictures.
    pub camera_dir: String,
    /// Skip directories whose name starts with `.` when walking the
    /// material tree.
    pub skip_hidden: bool,
    /// Additions to the built-in extension tables.
    pub formats: FormatsConfig,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            camera_dir: "DCIM".to_string(),
            skip_hidden: true,
            formats: FormatsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatsConfig {
    /// Extra preview extensions, without the dot.
    pub extra_compressed: Vec<String>,
    /// Extra RAW extensions, without the dot.
    pub extra_raw: Vec<String>,
}

impl BackfillConfig {
    /// Validate values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "camera_dir must not be empty".into(),
            ));
        }
        for ext in self
            .formats
            .extra_compressed
            .iter()
            .chain(&self.formats.extra_raw)
        {
            if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "invalid extension {ext:?}: use the bare extension, e.g. \"cr2\""
                )));
            }
        }

        // an extension cannot be both a preview and a RAW
        let table = FormatTable::default();
        for ext in &self.formats.extra_compressed {
            let clash = self
                .formats
                .extra_raw
                .iter()
                .any(|r| r.eq_ignore_ascii_case(ext))
                || table.classify_extension(ext) == ExtensionClass::Raw;
            if clash {
                return Err(ConfigError::Validation(format!(
                    "extension {ext:?} is listed as both compressed and raw"
                )));
            }
        }
        for ext in &self.formats.extra_raw {
            if table.classify_extension(ext) == ExtensionClass::Compressed {
                return Err(ConfigError::Validation(format!(
                    "extension {ext:?} is listed as both compressed and raw"
                )));
            }
        }
        Ok(())
    }

    /// The extension table for this configuration.
    pub fn format_table(&self) -> FormatTable {
        FormatTable::with_extras(&self.formats.extra_compressed, &self.formats.extra_raw)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// The stock defaults as a TOML table, the base layer for user overrides.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BackfillConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BackfillConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BackfillConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `raw-backfill.toml` from the material root, or the defaults when the
/// file does not exist.
pub fn load_config(material_root: &Path) -> Result<BackfillConfig, ConfigError> {
    let path = material_root.join(CONFIG_FILENAME);
    let overlay = if path.is_file() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<BackfillConfig, ConfigError> {
    resolve_config(Some(load_raw_config(path)?))
}

/// Fully-commented stock config, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# raw-backfill configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Place this file in the material root as raw-backfill.toml, or pass it
# with --config. Unknown keys are an error.

# Subdirectory of each camera root that holds the pictures. When a camera
# root has no such directory you are asked whether to scan the root itself.
camera_dir = "DCIM"

# Skip directories whose name starts with "." in the material tree.
skip_hidden = true

# ---------------------------------------------------------------------------
# Extension tables
# ---------------------------------------------------------------------------
# Built in, compressed: jpg jpeg heic png webp
# Built in, raw: 3fr arw cr2 cr3 crw dcr dng erf fff gpr iiq kdc mef mos mrw
#                nef nefx nrw orf pef raf raw rw2 rwl srf srw tif x3f
[formats]
# Extra preview extensions, without the dot (e.g. ["avif"]).
extra_compressed = []

# Extra RAW extensions, without the dot (e.g. ["bay"]).
extra_raw = []
"##
}
