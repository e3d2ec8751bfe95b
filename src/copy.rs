//! Copy execution.
//!
//! A copy brings the bytes, the permission bits, and the access and
//! modification times of the source. Destinations are never overwritten: if
//! something already sits at the target path the copy fails for that file.
//!
//! Batches are best-effort. A failing file is logged and counted, and the
//! rest of the batch still runs. Nothing is rolled back.

use crate::plan::PendingCopy;
use serde::Serialize;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopyError {
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),
    #[error("copy {} -> {}: {source}", from.display(), to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of one batch.
#[derive(Debug, Default, Serialize)]
pub struct CopyReport {
    pub copied: Vec<PendingCopy>,
    #[serde(serialize_with = "serialize_failures")]
    pub failed: Vec<(PendingCopy, CopyError)>,
    pub bytes: u64,
}

impl CopyReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

fn serialize_failures<S: serde::Serializer>(
    failed: &[(PendingCopy, CopyError)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(failed.len()))?;
    for (copy, err) in failed {
        seq.serialize_element(&(copy, err.to_string()))?;
    }
    seq.end()
}

/// Copy one file, preserving permissions and timestamps. Returns the number
/// of bytes copied.
///
/// The destination is created with `create_new`, so an existing file is
/// never touched. A partially written destination is removed on failure.
pub fn copy_file(source: &Path, destination: &Path) -> Result<u64, CopyError> {
    let wrap = |e: io::Error| CopyError::Io {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };

    let mut reader = File::open(source).map_err(wrap)?;
    let metadata = reader.metadata().map_err(wrap)?;
    let mut writer = File::create_new(destination).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            CopyError::DestinationExists(destination.to_path_buf())
        } else {
            wrap(e)
        }
    })?;

    let result = io::copy(&mut reader, &mut writer).and_then(|bytes| {
        writer.set_times(file_times(&metadata))?;
        drop(writer);
        // permissions last: a read-only source would otherwise block set_times
        fs::set_permissions(destination, metadata.permissions())?;
        Ok(bytes)
    });

    result.map_err(|e| {
        if let Err(cleanup) = fs::remove_file(destination) {
            log::warn!(
                "could not remove partial copy {}: {cleanup}",
                destination.display()
            );
        }
        wrap(e)
    })
}

fn file_times(metadata: &fs::Metadata) -> FileTimes {
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    times
}

/// Run a batch of copies, continuing past failures.
pub fn execute(copies: &[PendingCopy]) -> CopyReport {
    let mut report = CopyReport::default();
    for copy in copies {
        match copy_file(&copy.source, &copy.destination) {
            Ok(bytes) => {
                log::info!(
                    "copied {} -> {}",
                    copy.source.display(),
                    copy.destination.display()
                );
                report.bytes += bytes;
                report.copied.push(copy.clone());
            }
            Err(e) => {
                log::error!("{e}");
                report.failed.push((copy.clone(), e));
            }
        }
    }
    report
}
