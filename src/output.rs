//! Console output.
//!
//! Each listing has a `format_*` function returning lines (pure, tested) and,
//! where the CLI prints it directly, a `print_*` wrapper.
//!
//! ## Dry run
//!
//! ```text
//! /photos/2024-spring
//!     IMG_0001.CR2 ← /media/card/DCIM/100CANON/IMG_0001.CR2
//!     IMG_0004.CR2 ← /media/card/DCIM/100CANON/IMG_0004.CR2
//! ```
//!
//! ## Summary
//!
//! ```text
//! Camera storage
//!     /media/card
//! Indexed 812 RAW files
//! Visited 37 folders, 4 with missing RAW files
//! Copied 11 of 12 RAW files (0.3 GB)
//!     failed: /media/card/DCIM/100CANON/IMG_0009.CR2: ...
//! Skipped 2 previews without readable capture metadata
//!     /photos/2024-spring/edit.jpg
//! ```

use crate::plan::PendingCopy;
use crate::run::{RunOutcome, RunSummary};
use std::path::{Path, PathBuf};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Comma-separated display of several paths.
pub fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Header shown above a folder's copy list in the confirmation prompt.
pub fn folder_message(folder: &Path) -> String {
    format!(
        "\nMaterial folder {} will receive these RAW files:",
        folder.display()
    )
}

/// One line per pending copy: the camera path being imported.
pub fn format_copy_items(copies: &[PendingCopy]) -> Vec<String> {
    copies
        .iter()
        .map(|c| c.source.display().to_string())
        .collect()
}

pub fn format_dry_run(folder: &Path, copies: &[PendingCopy]) -> Vec<String> {
    let mut lines = vec![folder.display().to_string()];
    for copy in copies {
        let name = copy
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        lines.push(format!("{}{} ← {}", indent(1), name, copy.source.display()));
    }
    lines
}

pub fn print_dry_run(folder: &Path, copies: &[PendingCopy]) {
    for line in format_dry_run(folder, copies) {
        println!("{}", line);
    }
}

fn format_bytes(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    let mb = bytes as f64 / MB;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else {
        format!("{:.1} MB", mb)
    }
}

/// `verbose` adds the full list of unreadable previews.
pub fn format_summary(summary: &RunSummary, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();

    match summary.outcome {
        RunOutcome::NoCameraRoots => {
            lines.push("No camera storage found, nothing copied".to_string());
            return lines;
        }
        RunOutcome::NoRawFiles => {
            lines.push("No RAW files found on camera storage, nothing copied".to_string());
            return lines;
        }
        RunOutcome::Completed => {}
    }

    lines.push("Camera storage".to_string());
    for root in &summary.camera_roots {
        lines.push(format!("{}{}", indent(1), root.display()));
    }
    lines.push(format!("Indexed {} RAW files", summary.raw_files_indexed));
    lines.push(format!(
        "Visited {} folders, {} with missing RAW files",
        summary.folders_visited, summary.folders_with_copies
    ));

    if summary.dry_run {
        lines.push(format!(
            "Dry run: {} RAW files would be copied",
            summary.planned
        ));
    } else {
        lines.push(format!(
            "Copied {} of {} RAW files ({})",
            summary.copied,
            summary.planned,
            format_bytes(summary.bytes_copied)
        ));
        if summary.declined_folders > 0 {
            lines.push(format!(
                "{}declined: {} folders",
                indent(1),
                summary.declined_folders
            ));
        }
        for failure in &summary.failed {
            lines.push(format!("{}failed: {}", indent(1), failure.error));
        }
    }

    if !summary.unreadable.is_empty() {
        lines.push(format!(
            "Skipped {} previews without readable capture metadata",
            summary.unreadable.len()
        ));
        if verbose {
            for path in &summary.unreadable {
                lines.push(format!("{}{}", indent(1), path.display()));
            }
        }
    }

    lines
}

pub fn print_summary(summary: &RunSummary, verbose: bool) {
    for line in format_summary(summary, verbose) {
        println!("{}", line);
    }
}
