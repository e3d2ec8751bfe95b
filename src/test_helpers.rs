//! Shared test utilities.
//!
//! - [`MockReader`]: a scripted [`IdentityReader`] that records every path it
//!   was asked about, so tests can assert which files were (not) read.
//! - [`ExifFixture`]: writes the smallest TIFF (or JPEG, RAF, MRW, CR3
//!   wrapping one) that carries Make/Model/DateTime tags, for tests that go
//!   through the real EXIF parser.
//! - [`camera_card`] / [`material_folder`]: tempdir layouts.

use crate::containers::CANON_UUID;
use crate::identity::{CaptureIdentity, IdentityReader};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// =========================================================================
// Mock identity reader
// =========================================================================

/// Returns scripted identities; unknown paths get an empty identity.
/// Uses Mutex (not RefCell) so it stays Sync like the production reader.
#[derive(Default)]
pub struct MockReader {
    identities: HashMap<PathBuf, CaptureIdentity>,
    reads: Mutex<Vec<PathBuf>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, identity: CaptureIdentity) -> Self {
        self.identities.insert(path.into(), identity);
        self
    }

    /// Every path passed to `read_identity`, in call order.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().unwrap().clone()
    }

    pub fn was_read(&self, path: impl AsRef<Path>) -> bool {
        self.reads.lock().unwrap().iter().any(|p| p == path.as_ref())
    }
}

impl IdentityReader for MockReader {
    fn read_identity(&self, path: &Path) -> CaptureIdentity {
        self.reads.lock().unwrap().push(path.to_path_buf());
        self.identities.get(path).cloned().unwrap_or_default()
    }
}

// =========================================================================
// EXIF fixtures
// =========================================================================

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

/// Tags to embed in a synthetic image. `None` leaves the tag out.
#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    pub make: Option<String>,
    pub model: Option<String>,
    pub date_time: Option<String>,
    pub date_time_original: Option<String>,
}

impl ExifFixture {
    pub fn new(make: &str, model: &str, date_time: &str) -> Self {
        Self {
            make: Some(make.into()),
            model: Some(model.into()),
            date_time: Some(date_time.into()),
            date_time_original: None,
        }
    }

    /// Little-endian TIFF: IFD0 with the ASCII tags, plus an Exif sub-IFD
    /// when `date_time_original` is set. No image data.
    pub fn to_tiff(&self) -> Vec<u8> {
        tiff(&self.ifd0_entries(), &self.exif_entries())
    }

    /// [`Self::to_tiff`] with a vendor header in place of `II*\0`, the way
    /// RW2 (`IIU\0`) and ORF (`IIRO`) files start.
    pub fn to_vendor_tiff(&self, magic: [u8; 4]) -> Vec<u8> {
        let mut out = self.to_tiff();
        out[..4].copy_from_slice(&magic);
        out
    }

    /// RAF: Fujifilm header with the JPEG offset and length at bytes 84..92,
    /// then the embedded JPEG.
    pub fn to_raf(&self) -> Vec<u8> {
        const JPEG_START: usize = 100;
        let jpeg = self.to_jpeg();
        let mut out = b"FUJIFILMCCD-RAW 0201FF383501".to_vec();
        out.resize(84, 0);
        out.extend_from_slice(&(JPEG_START as u32).to_be_bytes());
        out.extend_from_slice(&(jpeg.len() as u32).to_be_bytes());
        out.resize(JPEG_START, 0);
        out.extend_from_slice(&jpeg);
        out
    }

    /// MRW: a `\0PRD` block followed by the `\0TTW` block holding the TIFF.
    pub fn to_mrw(&self) -> Vec<u8> {
        let mut blocks = Vec::new();
        for (name, payload) in [(b"\0PRD", vec![0u8; 24]), (b"\0TTW", self.to_tiff())] {
            blocks.extend_from_slice(name);
            blocks.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            blocks.extend_from_slice(&payload);
        }
        let mut out = b"\0MRM".to_vec();
        out.extend_from_slice(&(blocks.len() as u32).to_be_bytes());
        out.extend_from_slice(&blocks);
        out
    }

    /// CR3: `ftyp crx `, then `moov` → Canon `uuid` → `CMT1` (IFD0 tags) and,
    /// when `date_time_original` is set, `CMT2` (Exif tags as IFD0).
    pub fn to_cr3(&self) -> Vec<u8> {
        let mut canon = CANON_UUID.to_vec();
        canon.extend(iso_box(b"CMT1", &tiff(&self.ifd0_entries(), &[])));
        let exif = self.exif_entries();
        if !exif.is_empty() {
            canon.extend(iso_box(b"CMT2", &tiff(&exif, &[])));
        }
        let moov = iso_box(b"moov", &iso_box(b"uuid", &canon));

        let mut out = iso_box(b"ftyp", b"crx \0\0\0\x01crx isom");
        out.extend(moov);
        out.extend(iso_box(b"mdat", &[0u8; 32]));
        out
    }

    fn ifd0_entries(&self) -> Vec<(u16, Vec<u8>)> {
        [
            (TAG_MAKE, &self.make),
            (TAG_MODEL, &self.model),
            (TAG_DATE_TIME, &self.date_time),
        ]
        .into_iter()
        .filter_map(|(tag, value)| value.as_deref().map(|v| (tag, ascii(v))))
        .collect()
    }

    fn exif_entries(&self) -> Vec<(u16, Vec<u8>)> {
        self.date_time_original
            .iter()
            .map(|v| (TAG_DATE_TIME_ORIGINAL, ascii(v)))
            .collect()
    }

    /// Baseline JPEG shell with the TIFF in an `Exif\0\0` APP1 segment.
    pub fn to_jpeg(&self) -> Vec<u8> {
        let tiff = self.to_tiff();
        let segment_len = (2 + 6 + tiff.len()) as u16;
        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    /// Write to `path`, picking the container from the extension.
    pub fn write(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let bytes = match ext.as_str() {
            "jpg" | "jpeg" => self.to_jpeg(),
            "rw2" => self.to_vendor_tiff(*b"IIU\0"),
            "orf" => self.to_vendor_tiff(*b"IIRO"),
            "raf" => self.to_raf(),
            "mrw" => self.to_mrw(),
            "cr3" => self.to_cr3(),
            _ => self.to_tiff(),
        };
        fs::write(path, bytes).unwrap();
    }
}

/// TIFF with `ifd0` entries and, when `exif_ifd` is non-empty, an Exif
/// sub-IFD linked from IFD0.
fn tiff(ifd0: &[(u16, Vec<u8>)], exif_ifd: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let has_exif = !exif_ifd.is_empty();

    let ifd0_start = 8;
    let ifd0_data_start = ifd0_start + ifd_len(ifd0.len() + usize::from(has_exif));
    let exif_start = ifd0_data_start + ifd0.iter().map(|(_, v)| data_len(v)).sum::<usize>();
    let exif_data_start = exif_start + ifd_len(exif_ifd.len());

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&(ifd0_start as u32).to_le_bytes());
    write_ifd(&mut out, ifd0, ifd0_data_start, has_exif.then_some(exif_start));
    if has_exif {
        write_ifd(&mut out, exif_ifd, exif_data_start, None);
    }
    out
}

fn iso_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

fn ascii(s: &str) -> Vec<u8> {
    let mut v = s.as_bytes().to_vec();
    v.push(0);
    v
}

fn ifd_len(entries: usize) -> usize {
    2 + 12 * entries + 4
}

/// Bytes an ASCII value occupies outside the entry (values of up to four
/// bytes live inline). Word-aligned.
fn data_len(value: &[u8]) -> usize {
    if value.len() > 4 {
        value.len() + value.len() % 2
    } else {
        0
    }
}

fn write_ifd(
    out: &mut Vec<u8>,
    entries: &[(u16, Vec<u8>)],
    data_start: usize,
    exif_pointer: Option<usize>,
) {
    let count = entries.len() + usize::from(exif_pointer.is_some());
    out.extend_from_slice(&(count as u16).to_le_bytes());

    let mut data = Vec::new();
    for (tag, value) in entries {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&TYPE_ASCII.to_le_bytes());
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        if value.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..value.len()].copy_from_slice(value);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&((data_start + data.len()) as u32).to_le_bytes());
            data.extend_from_slice(value);
            if value.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    if let Some(offset) = exif_pointer {
        out.extend_from_slice(&TAG_EXIF_IFD.to_le_bytes());
        out.extend_from_slice(&TYPE_LONG.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(offset as u32).to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data);
}

// =========================================================================
// Directory layouts
// =========================================================================

/// Write RAW fixtures under `<root>/DCIM/<relative>` and return their paths.
pub fn camera_card(root: &Path, files: &[(&str, &ExifFixture)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(rel, fixture)| {
            let path = root.join("DCIM").join(rel);
            fixture.write(&path);
            path
        })
        .collect()
}

/// Write preview fixtures directly inside `folder`.
pub fn material_folder(folder: &Path, files: &[(&str, &ExifFixture)]) {
    for (name, fixture) in files {
        fixture.write(&folder.join(name));
    }
}
