//! Capture identity extraction.
//!
//! A file name alone cannot tell two captures apart: cameras reuse
//! `IMG_0001` after a counter reset, and two bodies of the same brand happily
//! produce the same names on the same day. The tool therefore fingerprints
//! every candidate pair with three EXIF tags:
//!
//! | Field | Tag | Notes |
//! |-------|-----|-------|
//! | make | IFD0 `Make` (0x010F) | |
//! | model | IFD0 `Model` (0x0110) | |
//! | timestamp | Exif `DateTimeOriginal` (0x9003), else IFD0 `DateTime` (0x0132) | verbatim string, never parsed |
//!
//! ## Fail-soft contract
//!
//! [`IdentityReader::read_identity`] never fails. A file that cannot be
//! opened, has no EXIF block, or lacks a tag produces a [`CaptureIdentity`]
//! with the corresponding fields set to `None`. An incomplete identity never
//! matches anything, so a broken file can only ever cause a missed copy,
//! never a wrong one.

use crate::containers::{self, Container, ExifBlock};
use exif::{Exif, In, Tag, Value};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// The (make, model, timestamp) fingerprint of one image file.
///
/// The derived `PartialEq` is structural. Use [`CaptureIdentity::matches`]
/// for capture equality: it additionally requires every field to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureIdentity {
    pub make: Option<String>,
    pub model: Option<String>,
    pub timestamp: Option<String>,
}

impl CaptureIdentity {
    /// A fully-populated identity.
    pub fn new(make: &str, model: &str, timestamp: &str) -> Self {
        Self {
            make: Some(make.to_string()),
            model: Some(model.to_string()),
            timestamp: Some(timestamp.to_string()),
        }
    }

    /// True when all three fields are present.
    pub fn is_complete(&self) -> bool {
        self.make.is_some() && self.model.is_some() && self.timestamp.is_some()
    }

    /// Capture equality: all three fields present on both sides and
    /// byte-identical.
    pub fn matches(&self, other: &CaptureIdentity) -> bool {
        self.is_complete() && other.is_complete() && self == other
    }
}

/// Source of capture identities.
///
/// Production code uses [`ExifReader`]; tests drive the match engine with a
/// scripted reader so they can control identities without writing images.
pub trait IdentityReader {
    fn read_identity(&self, path: &Path) -> CaptureIdentity;
}

/// Reads identities from embedded EXIF via `kamadak-exif`.
///
/// Previews (JPEG, HEIF, PNG, WebP) go straight to the parser. RAW files are
/// unwrapped by [`crate::containers`] first, which covers plain TIFF-based
/// RAW (CR2, NEF, ARW, DNG, ...), the vendor-magic TIFFs (RW2, ORF), RAF,
/// MRW and CR3. X3F and CIFF-based CRW carry no TIFF EXIF block and yield an
/// empty identity.
///
/// RAW files are parsed from their first [`HEAD_LIMIT`] bytes; the rest of
/// the file is read only when the identity is not complete within them.
/// Parse errors in unrelated IFDs (maker notes, thumbnails) are ignored as
/// long as the tags we need were read.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifReader;

/// Bytes of a RAW file parsed before falling back to the whole file.
pub const HEAD_LIMIT: u64 = 1 << 20;

const SNIFF_LEN: u64 = 16;

impl IdentityReader for ExifReader {
    fn read_identity(&self, path: &Path) -> CaptureIdentity {
        match read_identity_from(path, HEAD_LIMIT) {
            Ok(identity) => identity,
            Err(e) => {
                log::debug!("no EXIF identity for {}: {e}", path.display());
                CaptureIdentity::default()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),
    #[error("no EXIF block in container")]
    NoExifBlock,
}

fn read_identity_from(path: &Path, head_limit: u64) -> Result<CaptureIdentity, ReadError> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.by_ref().take(SNIFF_LEN).read_to_end(&mut data)?;

    let container = containers::sniff(&data);
    if container == Container::Other {
        file.rewind()?;
        let exif = lenient_reader()
            .read_from_container(&mut BufReader::new(file))
            .or_else(distill)?;
        return Ok(identity_from_exif(&exif));
    }

    let remaining = head_limit.saturating_sub(data.len() as u64);
    file.by_ref().take(remaining).read_to_end(&mut data)?;
    let head = identity_from_block(container, &data);
    let complete = matches!(head, Ok(ref identity) if identity.is_complete());
    if complete || (data.len() as u64) < head_limit {
        return head;
    }

    log::trace!(
        "{}: identity not within the first {head_limit} bytes, reading the whole file",
        path.display()
    );
    file.read_to_end(&mut data)?;
    identity_from_block(container, &data)
}

fn identity_from_block(container: Container, data: &[u8]) -> Result<CaptureIdentity, ReadError> {
    let block = containers::exif_block(container, data).ok_or(ReadError::NoExifBlock)?;
    match block {
        ExifBlock::Tiff(tiff) => Ok(identity_from_exif(&parse_tiff(tiff)?)),
        ExifBlock::Jpeg(jpeg) => {
            let exif = lenient_reader()
                .read_from_container(&mut Cursor::new(jpeg))
                .or_else(distill)?;
            Ok(identity_from_exif(&exif))
        }
        ExifBlock::Split { ifd0, exif } => {
            let ifd0 = parse_tiff(ifd0)?;
            // the Exif IFD is stored as its own IFD0, so its tags carry the
            // TIFF context and are looked up by number
            let original = exif
                .and_then(|tiff| parse_tiff(tiff).ok())
                .and_then(|parsed| {
                    parsed
                        .fields()
                        .find(|f| {
                            f.ifd_num == In::PRIMARY
                                && f.tag.number() == Tag::DateTimeOriginal.number()
                        })
                        .and_then(|f| ascii_value(&f.value))
                });
            Ok(CaptureIdentity {
                make: ascii_field(&ifd0, Tag::Make),
                model: ascii_field(&ifd0, Tag::Model),
                timestamp: original.or_else(|| ascii_field(&ifd0, Tag::DateTime)),
            })
        }
    }
}

fn lenient_reader() -> exif::Reader {
    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);
    reader
}

/// Keep what was parsed when only some IFDs were broken.
fn distill(err: exif::Error) -> Result<Exif, exif::Error> {
    err.distill_partial_result(|errors| {
        for e in errors {
            log::trace!("ignored EXIF error: {e}");
        }
    })
}

fn parse_tiff(tiff: Vec<u8>) -> Result<Exif, exif::Error> {
    lenient_reader().read_raw(tiff).or_else(distill)
}

fn identity_from_exif(exif: &Exif) -> CaptureIdentity {
    CaptureIdentity {
        make: ascii_field(exif, Tag::Make),
        model: ascii_field(exif, Tag::Model),
        timestamp: ascii_field(exif, Tag::DateTimeOriginal)
            .or_else(|| ascii_field(exif, Tag::DateTime)),
    }
}

/// First ASCII component of a primary-image tag, with NUL and space padding
/// stripped from the end. Empty strings count as absent.
fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    ascii_value(&exif.get_field(tag, In::PRIMARY)?.value)
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_end_matches(['\0', ' '])
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}
