//! One backfill run, end to end.
//!
//! ```text
//! material root ──▶ camera roots ──▶ RAW index (once)
//!                                          │
//!         ┌────────────────────────────────┘
//!         ▼
//! for each material folder with files:
//!     plan_copies ──▶ confirm (unless --yes) ──▶ copy
//! ```
//!
//! A run with no camera roots or no RAW files ends early with zero copies
//! instead of walking what may be a very large material tree for nothing.
//! Per-file problems (unreadable metadata, failed copies) are absorbed and
//! counted; only problems with the material root itself or the console abort
//! the run.

use crate::confirm::{ConfirmError, Gate};
use crate::context::RunContext;
use crate::copy;
use crate::drives;
use crate::formats::ExtensionClass;
use crate::identity::IdentityReader;
use crate::index::{RawIndex, build_index};
use crate::output;
use crate::plan::plan_copies;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("material root {0} is not accessible: {1}")]
    MaterialRoot(PathBuf, #[source] io::Error),
    #[error("material root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Confirm(#[from] ConfirmError),
}

/// Where camera roots come from.
#[derive(Debug, Clone)]
pub enum CameraSources {
    /// Roots named on the command line, used as given.
    Explicit(Vec<PathBuf>),
    /// Mount points checked for a camera directory.
    Discover(Vec<PathBuf>),
}

impl CameraSources {
    /// Explicit roots from `--source` tokens, or platform discovery when
    /// there are none.
    pub fn from_tokens(tokens: &[String]) -> Self {
        if tokens.is_empty() {
            CameraSources::Discover(drives::candidate_roots())
        } else {
            CameraSources::Explicit(tokens.iter().map(|t| drives::normalize_source(t)).collect())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    NoCameraRoots,
    NoRawFiles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// Totals for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub material_root: PathBuf,
    pub camera_roots: Vec<PathBuf>,
    /// RAW files in the merged index, counting every same-named variant.
    pub raw_files_indexed: usize,
    pub folders_visited: usize,
    /// Folders that had at least one planned copy.
    pub folders_with_copies: usize,
    pub declined_folders: usize,
    pub planned: usize,
    pub copied: usize,
    pub bytes_copied: u64,
    pub failed: Vec<FailedCopy>,
    /// Previews skipped because their own capture identity was incomplete.
    pub unreadable: Vec<PathBuf>,
    pub dry_run: bool,
}

impl RunSummary {
    fn new(material_root: PathBuf, dry_run: bool) -> Self {
        Self {
            outcome: RunOutcome::Completed,
            material_root,
            camera_roots: Vec::new(),
            raw_files_indexed: 0,
            folders_visited: 0,
            folders_with_copies: 0,
            declined_folders: 0,
            planned: 0,
            copied: 0,
            bytes_copied: 0,
            failed: Vec::new(),
            unreadable: Vec::new(),
            dry_run,
        }
    }
}

/// Run one full backfill of `material_root` from `sources`.
pub fn run<R: IdentityReader + ?Sized>(
    ctx: &RunContext,
    material_root: &Path,
    sources: &CameraSources,
    reader: &R,
    gate: &mut Gate<'_>,
) -> Result<RunSummary, RunError> {
    let material_root = resolve_material_root(material_root)?;
    log::info!("material folder: {}", material_root.display());
    let mut summary = RunSummary::new(material_root.clone(), ctx.dry_run);

    let roots = match sources {
        CameraSources::Explicit(roots) => roots.clone(),
        CameraSources::Discover(candidates) => {
            let found =
                drives::discover_camera_roots(candidates, &material_root, &ctx.config.camera_dir);
            if !found.is_empty() {
                log::info!("found camera storage: {}", output::join_paths(&found));
            }
            found
        }
    };
    if roots.is_empty() {
        log::error!("no camera storage found");
        summary.outcome = RunOutcome::NoCameraRoots;
        return Ok(summary);
    }

    let explicit = matches!(sources, CameraSources::Explicit(_));
    let index = index_camera_roots(ctx, &roots, explicit, gate, &mut summary)?;
    if index.is_empty() {
        log::error!("no RAW files found on camera storage");
        summary.outcome = RunOutcome::NoRawFiles;
        return Ok(summary);
    }
    summary.raw_files_indexed = index.file_count();
    log::info!(
        "indexed {} RAW files under {} base names",
        index.file_count(),
        index.len()
    );

    log::info!("scanning material folders");
    for (folder, files) in material_folders(&material_root, ctx.config.skip_hidden) {
        summary.folders_visited += 1;
        process_folder(ctx, &folder, &files, &index, reader, gate, &mut summary)?;
    }

    log::info!("import finished, {} RAW files copied", summary.copied);
    Ok(summary)
}

fn resolve_material_root(path: &Path) -> Result<PathBuf, RunError> {
    let root =
        fs::canonicalize(path).map_err(|e| RunError::MaterialRoot(path.to_path_buf(), e))?;
    if !root.is_dir() {
        return Err(RunError::NotADirectory(root));
    }
    Ok(root)
}

/// Build the merged index over all roots, in root order.
///
/// A root without the camera directory is scanned whole only when the user
/// agrees. Under `--yes` that agreement is implied for roots named on the
/// command line and withheld for discovered ones.
fn index_camera_roots(
    ctx: &RunContext,
    roots: &[PathBuf],
    explicit: bool,
    gate: &mut Gate<'_>,
    summary: &mut RunSummary,
) -> Result<RawIndex, RunError> {
    let camera_dir = &ctx.config.camera_dir;
    let mut index = RawIndex::new();

    for root in roots {
        if !root.is_dir() {
            log::warn!("camera root {} does not exist, skipping", root.display());
            continue;
        }
        let scan_dir = match drives::camera_scan_dir(root, camera_dir) {
            Some(dir) => dir,
            None => {
                let question = format!(
                    "{} not found, scan {} instead?",
                    root.join(camera_dir).display(),
                    root.display()
                );
                if !gate.ask(&question, false, explicit)? {
                    log::info!("skipping {}", root.display());
                    continue;
                }
                root.clone()
            }
        };

        log::info!("scanning {} for RAW files", scan_dir.display());
        index.extend(build_index(&scan_dir, ExtensionClass::Raw, &ctx.formats));
        summary.camera_roots.push(root.clone());
    }

    Ok(index)
}

/// Every directory under `root` (root included) that directly contains at
/// least one file, with those files' names sorted.
pub fn material_folders(root: &Path, skip_hidden: bool) -> Vec<(PathBuf, Vec<PathBuf>)> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(skip_hidden && e.depth() > 0 && is_hidden(e.file_name())));

    let mut folders = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable material entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let files = list_files(entry.path());
        if !files.is_empty() {
            folders.push((entry.into_path(), files));
        }
    }
    folders
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot list {}: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| PathBuf::from(e.file_name()))
        .collect();
    files.sort();
    files
}

fn process_folder<R: IdentityReader + ?Sized>(
    ctx: &RunContext,
    folder: &Path,
    files: &[PathBuf],
    index: &RawIndex,
    reader: &R,
    gate: &mut Gate<'_>,
    summary: &mut RunSummary,
) -> Result<(), RunError> {
    log::debug!("scanning folder {}", folder.display());
    let plan = plan_copies(folder, files, index, &ctx.formats, reader);
    summary.unreadable.extend(plan.unreadable.iter().cloned());
    if plan.is_empty() {
        return Ok(());
    }

    summary.folders_with_copies += 1;
    summary.planned += plan.copies.len();

    if ctx.dry_run {
        output::print_dry_run(folder, &plan.copies);
        return Ok(());
    }

    let items = output::format_copy_items(&plan.copies);
    let message = output::folder_message(folder);
    if !gate.confirm_batch("Import?", &message, &items, true)? {
        log::info!("import into {} declined", folder.display());
        summary.declined_folders += 1;
        return Ok(());
    }

    let report = copy::execute(&plan.copies);
    summary.copied += report.copied_count();
    summary.bytes_copied += report.bytes;
    summary
        .failed
        .extend(report.failed.into_iter().map(|(copy, err)| FailedCopy {
            source: copy.source,
            destination: copy.destination,
            error: err.to_string(),
        }));
    Ok(())
}
