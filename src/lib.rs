//! # raw-backfill
//!
//! Backfills RAW originals into a curated photo folder tree. Photographers
//! often cull and sort the camera's JPEG/HEIC previews first and only later
//! want the RAW files of the keepers. This crate finds those RAW files on the
//! camera card and copies each one next to its preview.
//!
//! # Architecture
//!
//! ```text
//! 1. Discover   camera roots (explicit or mounted volumes with DCIM/)
//! 2. Index      every RAW file on them, by base name       (once per run)
//! 3. Per material folder:
//!      plan     match previews to RAW candidates by EXIF identity
//!      confirm  ask the user (or --yes)
//!      copy     metadata-preserving, never overwriting
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formats`] | Extension tables: compressed / raw / unrecognized |
//! | [`identity`] | EXIF (make, model, timestamp) fingerprint, fail-soft |
//! | [`containers`] | Finds the EXIF block in RAW containers the parser cannot open |
//! | [`index`] | Base-name → RAW paths index over camera storage |
//! | [`plan`] | The match engine: which RAW files a folder is missing |
//! | [`confirm`] | Yes/no prompts and the `--yes` bypass |
//! | [`copy`] | Best-effort batch copy |
//! | [`drives`] | Camera root discovery and source token parsing |
//! | [`run`] | Orchestrates one run and produces a [`run::RunSummary`] |
//! | [`config`] | Optional `raw-backfill.toml` loading and validation |
//! | [`context`] | Run-scoped settings passed to every stage |
//! | [`output`] | Console formatting of plans and summaries |
//!
//! # Design Decisions
//!
//! ## Name Is Not Enough
//!
//! Camera file counters wrap and reset, so `IMG_0001.CR2` on today's card is
//! often not the original of last year's `IMG_0001.JPG`. A copy is only
//! planned when make, model and capture timestamp are present on both files
//! and identical. Anything the tool cannot read is treated as "don't know",
//! which means "don't copy".
//!
//! ## First Match, Not Best Match
//!
//! Candidates sharing a base name are compared in index order and the first
//! identity match wins. With duplicate card backups mounted at once, the
//! first root given (or discovered) supplies the file.
//!
//! ## Folder at a Time
//!
//! Every material folder is planned, confirmed and copied on its own. The
//! camera index is built once and only read afterwards; nothing from one
//! folder's pass leaks into another's.

pub mod config;
pub mod confirm;
pub mod containers;
pub mod context;
pub mod copy;
pub mod drives;
pub mod formats;
pub mod identity;
pub mod index;
pub mod output;
pub mod plan;
pub mod run;

#[cfg(test)]
pub(crate) mod test_helpers;
