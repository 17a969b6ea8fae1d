//! This module contains definitions for the trailer of an MGH stream.
//! The trailer sits after the voxel data and holds optional scan
//! parameters followed by a sequence of tagged records, one of which
//! carries the volume's intent code.
//!
//! Records are kept in their original order and with their original
//! bytes, so that writing a trailer back reproduces the input exactly.
//! Legacy records which do not declare a 64-bit length cannot be skipped
//! reliably; parsing stops there and everything from that point on is
//! kept as an opaque tail.

use crate::error::{MghError, Result};
use byteordered::ByteOrdered;
use std::io::Write;

/// Legacy color table record, no length field.
pub const TAG_OLD_COLORTABLE: i32 = 1;
/// Legacy "use real RAS" record, no length field.
pub const TAG_OLD_USEREALRAS: i32 = 2;
/// Legacy surface geometry record, no length field.
pub const TAG_OLD_SURF_GEOM: i32 = 20;
/// Legacy transform file name record, 32-bit length field.
pub const TAG_OLD_MGH_XFORM: i32 = 30;
/// Intent code record, 8-byte big-endian payload.
pub const TAG_INTENT: i32 = 48;

/// Number of bytes taken by the scan parameters block.
const SCAN_PARAMETERS_LEN: usize = 20;

/// Acquisition parameters optionally stored right after the voxel data.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct ScanParameters {
    /// Repetition time
    pub tr: f32,
    /// Flip angle, in radians
    pub flip_angle: f32,
    /// Echo time
    pub te: f32,
    /// Inversion time
    pub ti: f32,
    /// Field of view
    pub fov: f32,
}

/// Data type for a single tagged record of the trailer.
#[derive(Debug, PartialEq, Clone)]
pub struct Tag {
    id: i32,
    data: Vec<u8>,
}

impl Tag {
    /// Create a tag out of its identifier and payload.
    pub fn new(id: i32, data: Vec<u8>) -> Self {
        Tag { id, data }
    }

    /// Create an intent record holding the given code.
    pub fn intent(code: i64) -> Self {
        Tag::new(TAG_INTENT, code.to_be_bytes().to_vec())
    }

    /// Obtain the tag's identifier.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Obtain the tag's payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Interpret this record as an intent code, if it is a well-formed one.
    pub fn intent_code(&self) -> Option<i64> {
        if self.id != TAG_INTENT || self.data.len() != 8 {
            return None;
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.data);
        Some(i64::from_be_bytes(raw))
    }

    fn write<W: Write>(&self, output: W) -> Result<()> {
        let mut output = ByteOrdered::be(output);
        output.write_i32(self.id)?;
        output.write_i64(self.data.len() as i64)?;
        output.write_all(&self.data)?;
        Ok(())
    }
}

/// Everything stored after the voxel data of an MGH stream.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Trailer {
    scan_parameters: Option<ScanParameters>,
    tags: Vec<Tag>,
    tail: Vec<u8>,
}

impl Trailer {
    /// Create a trailer out of its main components.
    pub fn new(scan_parameters: Option<ScanParameters>, tags: Vec<Tag>, tail: Vec<u8>) -> Self {
        Trailer {
            scan_parameters,
            tags,
            tail,
        }
    }

    /// Parse the bytes following the voxel data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SCAN_PARAMETERS_LEN {
            // not even scan parameters: keep whatever is there untouched
            return Ok(Trailer::new(None, Vec::new(), bytes.to_vec()));
        }

        let mut input = ByteOrdered::be(bytes);
        let scan_parameters = ScanParameters {
            tr: input.read_f32()?,
            flip_angle: input.read_f32()?,
            te: input.read_f32()?,
            ti: input.read_f32()?,
            fov: input.read_f32()?,
        };

        let mut rest = &bytes[SCAN_PARAMETERS_LEN..];
        let mut tags = Vec::new();
        while let Some((tag, len)) = next_tag(rest)? {
            tags.push(tag);
            rest = &rest[len..];
        }

        Ok(Trailer::new(Some(scan_parameters), tags, rest.to_vec()))
    }

    /// Write the trailer back, in its original layout.
    pub fn write<W: Write>(&self, mut output: W) -> Result<()> {
        if let Some(p) = &self.scan_parameters {
            let mut o = ByteOrdered::be(&mut output);
            for v in &[p.tr, p.flip_angle, p.te, p.ti, p.fov] {
                o.write_f32(*v)?;
            }
        }
        for tag in &self.tags {
            tag.write(&mut output)?;
        }
        output.write_all(&self.tail)?;
        Ok(())
    }

    /// The scan parameters, if present.
    pub fn scan_parameters(&self) -> Option<&ScanParameters> {
        self.scan_parameters.as_ref()
    }

    /// Obtain an iterator to the parsed records.
    pub fn iter(&self) -> ::std::slice::Iter<Tag> {
        self.tags.iter()
    }

    /// Bytes that could not be parsed as records.
    pub fn tail(&self) -> &[u8] {
        &self.tail
    }

    /// The intent code recorded in this trailer, if any.
    pub fn intent(&self) -> Option<i64> {
        self.tags.iter().find_map(Tag::intent_code)
    }

    /// Record the given intent code. An existing intent record is updated
    /// in place; otherwise a new record is appended after the last parsed
    /// record. Scan parameters are materialised with zeros if missing, as
    /// records cannot be stored without them.
    pub fn set_intent(&mut self, code: i64) {
        if let Some(tag) = self.tags.iter_mut().find(|t| t.id == TAG_INTENT) {
            *tag = Tag::intent(code);
            return;
        }
        if self.scan_parameters.is_none() {
            // an unparsed tail this short can only be padding
            self.tail.clear();
            self.scan_parameters = Some(ScanParameters::default());
        }
        self.tags.push(Tag::intent(code));
    }
}

impl<'a> IntoIterator for &'a Trailer {
    type Item = &'a Tag;
    type IntoIter = ::std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Try to parse one record at the start of `bytes`. Returns the record and
/// the number of bytes it takes, or `None` if no further record can be
/// parsed from here.
fn next_tag(bytes: &[u8]) -> Result<Option<(Tag, usize)>> {
    if bytes.len() < 12 {
        return Ok(None);
    }
    let mut input = ByteOrdered::be(bytes);
    let id = input.read_i32()?;
    match id {
        TAG_OLD_COLORTABLE | TAG_OLD_USEREALRAS | TAG_OLD_SURF_GEOM | TAG_OLD_MGH_XFORM => {
            return Ok(None)
        }
        _ => {}
    }
    let len = input.read_i64()?;
    if len < 0 || len as u64 > (bytes.len() - 12) as u64 {
        if id == TAG_INTENT {
            return Err(MghError::InvalidTag(id, len));
        }
        return Ok(None);
    }
    let len = len as usize;
    let data = bytes[12..12 + len].to_vec();
    Ok(Some((Tag::new(id, data), 12 + len)))
}
