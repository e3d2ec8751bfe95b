//! Locating EXIF inside RAW containers.
//!
//! `kamadak-exif` opens standard TIFF, JPEG, HEIF, PNG and WebP. Several RAW
//! formats wrap the same TIFF structure in something it rejects:
//!
//! | Format | Layout | EXIF block |
//! |--------|--------|------------|
//! | RW2, ORF | TIFF with a vendor magic (`IIU\0`, `IIRO`, `MMOR`) | the file itself, magic rewritten to 42 |
//! | RAF | `FUJIFILMCCD-RAW` header, embedded JPEG at the offset in bytes 84..92 | the JPEG's APP1 |
//! | MRW | `\0MRM` header blocks | the `\0TTW` block, a plain TIFF |
//! | CR3 | ISO BMFF, `moov` → Canon `uuid` box | `CMT1` (IFD0) and `CMT2` (Exif IFD) |
//!
//! Everything here works on an in-memory prefix of the file. Offsets that
//! point past the end of `data` are clamped, so a prefix that cuts a block
//! short yields a truncated block rather than a panic. The caller decides
//! whether to retry with more of the file.

/// Canon's metadata container inside the CR3 `moov` box.
pub const CANON_UUID: [u8; 16] = [
    0x85, 0xc0, 0xb6, 0x87, 0x82, 0x0f, 0x11, 0xe0, 0x81, 0x11, 0xf4, 0xce, 0x46, 0x2b, 0x6a, 0x48,
];

const RAF_MAGIC: &[u8] = b"FUJIFILMCCD-RAW";
const RAF_JPEG_OFFSET: usize = 84;
const MRW_MAGIC: &[u8] = b"\0MRM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Any `II`/`MM` header, standard or vendor magic.
    Tiff,
    Raf,
    Mrw,
    Cr3,
    /// Left to `kamadak-exif`'s own container detection.
    Other,
}

/// Where the EXIF lives once the container is unwrapped.
#[derive(Debug, PartialEq, Eq)]
pub enum ExifBlock<'a> {
    /// TIFF bytes with a standard header.
    Tiff(Vec<u8>),
    /// A JPEG carrying an `Exif` APP1 segment.
    Jpeg(&'a [u8]),
    /// IFD0 and Exif IFD stored as two separate TIFF streams.
    Split { ifd0: Vec<u8>, exif: Option<Vec<u8>> },
}

/// Identify the container from the first bytes of a file.
pub fn sniff(head: &[u8]) -> Container {
    if head.starts_with(RAF_MAGIC) {
        Container::Raf
    } else if head.starts_with(MRW_MAGIC) {
        Container::Mrw
    } else if head.get(4..8) == Some(&b"ftyp"[..]) && head.get(8..12) == Some(&b"crx "[..]) {
        Container::Cr3
    } else if head.len() >= 8 && (head.starts_with(b"II") || head.starts_with(b"MM")) {
        Container::Tiff
    } else {
        Container::Other
    }
}

/// The EXIF block of `data`, or `None` when it is not (fully) in there.
pub fn exif_block(container: Container, data: &[u8]) -> Option<ExifBlock<'_>> {
    match container {
        Container::Tiff => Some(ExifBlock::Tiff(standard_tiff(data)?)),
        Container::Raf => raf_jpeg(data).map(ExifBlock::Jpeg),
        Container::Mrw => Some(ExifBlock::Tiff(standard_tiff(mrw_ttw(data)?)?)),
        Container::Cr3 => cr3_blocks(data),
        Container::Other => None,
    }
}

/// Copy of a TIFF stream with bytes 2..4 set to the standard magic for its
/// byte order.
fn standard_tiff(data: &[u8]) -> Option<Vec<u8>> {
    let magic = match data.get(..8)?.get(..2)? {
        b"II" => [0x2A, 0x00],
        b"MM" => [0x00, 0x2A],
        _ => return None,
    };
    let mut tiff = data.to_vec();
    tiff[2..4].copy_from_slice(&magic);
    Some(tiff)
}

fn raf_jpeg(data: &[u8]) -> Option<&[u8]> {
    let offset = be_u32(data, RAF_JPEG_OFFSET)? as usize;
    let len = be_u32(data, RAF_JPEG_OFFSET + 4)? as usize;
    let end = offset.checked_add(len)?.min(data.len());
    data.get(offset..end).filter(|jpeg| !jpeg.is_empty())
}

/// The `\0TTW` block of an MRW header.
///
/// Layout: `\0MRM`, u32 BE length of the block area, then blocks of
/// (4-byte name, u32 BE length, payload).
fn mrw_ttw(data: &[u8]) -> Option<&[u8]> {
    let area_end = 8usize
        .checked_add(be_u32(data, 4)? as usize)?
        .min(data.len());
    let mut pos = 8;
    while pos + 8 <= area_end {
        let name = &data[pos..pos + 4];
        let len = be_u32(data, pos + 4)? as usize;
        let start = pos + 8;
        let end = start.checked_add(len)?.min(data.len());
        if name == b"\0TTW" {
            return data.get(start..end);
        }
        pos = end;
    }
    None
}

fn cr3_blocks(data: &[u8]) -> Option<ExifBlock<'_>> {
    let (_, moov) = boxes(data).find(|(kind, _)| *kind == b"moov")?;
    let (_, canon) =
        boxes(moov).find(|(kind, body)| *kind == b"uuid" && body.starts_with(&CANON_UUID))?;
    let children = &canon[CANON_UUID.len()..];
    let ifd0 = boxes(children).find(|(kind, _)| *kind == b"CMT1")?.1;
    let exif = boxes(children)
        .find(|(kind, _)| *kind == b"CMT2")
        .and_then(|(_, body)| standard_tiff(body));
    Some(ExifBlock::Split {
        ifd0: standard_tiff(ifd0)?,
        exif,
    })
}

/// ISO BMFF boxes at one nesting level, as (type, payload).
fn boxes(data: &[u8]) -> Boxes<'_> {
    Boxes { data, pos: 0 }
}

struct Boxes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Boxes<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        let pos = self.pos;
        let size = be_u32(data, pos)?;
        let kind = data.get(pos + 4..pos + 8)?;
        let (header, size) = match size {
            0 => (8, (data.len() - pos) as u64),
            1 => (16, be_u64(data, pos + 8)?),
            n => (8, u64::from(n)),
        };
        if size < header as u64 {
            return None;
        }
        let end = usize::try_from(size)
            .ok()
            .and_then(|size| pos.checked_add(size))
            .map_or(data.len(), |end| end.min(data.len()));
        let body = data.get(pos + header..end)?;
        self.pos = end;
        Some((kind, body))
    }
}

fn be_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn be_u64(data: &[u8], pos: usize) -> Option<u64> {
    let bytes = data.get(pos..pos.checked_add(8)?)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}
