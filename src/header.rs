//! This module defines the `MghHeader` struct, which is used
//! to provide important information about MGH volumes.

use crate::error::{MghError, Result};
use crate::typedef::MghType;
use crate::util::is_gz_file;
use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// The only MGH format version in existence.
pub const MGH_VERSION: i32 = 1;
/// Offset in bytes of the first voxel sample in an (uncompressed) MGH stream.
pub const MGH_DATA_START: usize = 284;
/// Number of bytes taken by the fixed integer fields at the start of the header.
const FIXED_FIELDS_LEN: usize = 30;
/// Number of bytes taken by the voxel sizes, direction cosines and centre.
const GEOMETRY_LEN: usize = 60;
/// Number of unused bytes padding the header up to `MGH_DATA_START`.
pub const RESERVED_LEN: usize = MGH_DATA_START - FIXED_FIELDS_LEN - GEOMETRY_LEN;

/// The MGH header data type.
/// All fields are public and named after their role in the format.
/// Geometry fields are always read, even if `ras_good` is not set,
/// so that writing the header back reproduces the original bytes.
///
/// # Example
///
/// ```no_run
/// use mgz_optimize::MghHeader;
/// # use mgz_optimize::Result;
///
/// # fn run() -> Result<()> {
/// let hdr = MghHeader::from_file("aseg.mgz")?;
/// println!("{:?}", hdr.dim);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MghHeader {
    /// Format version, must be 1
    pub version: i32,
    /// Width, height, depth and number of frames
    pub dim: [i32; 4],
    /// Storage type code (`MRI_*`)
    pub datatype: i32,
    /// Degrees of freedom
    pub dof: i32,
    /// Whether the geometry fields below are meaningful
    pub ras_good: i16,
    /// Voxel sizes
    pub delta: [f32; 3],
    /// Direction cosines, column-major x, y, z
    pub mdc: [f32; 9],
    /// RAS coordinates of the volume centre
    pub pxyz_c: [f32; 3],
    /// Unused bytes up to the start of the voxel data
    pub reserved: Vec<u8>,
}

impl Default for MghHeader {
    fn default() -> MghHeader {
        MghHeader {
            version: MGH_VERSION,
            dim: [1, 1, 1, 1],
            datatype: MghType::Uchar.code(),
            dof: 0,
            ras_good: 0,
            delta: [1.; 3],
            mdc: [-1., 0., 0., 0., 0., -1., 0., 1., 0.],
            pxyz_c: [0.; 3],
            reserved: vec![0; RESERVED_LEN],
        }
    }
}

impl MghHeader {
    /// Retrieve an MGH header from a file in the file system.
    /// If the file's name ends with ".mgz" or ".gz", the file is assumed
    /// to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MghHeader> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            MghHeader::from_reader(GzDecoder::new(file))
        } else {
            MghHeader::from_reader(file)
        }
    }

    /// Read an MGH header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// header. Exactly `MGH_DATA_START` bytes are consumed.
    pub fn from_reader<S: Read>(input: S) -> Result<MghHeader> {
        let mut input = ByteOrdered::be(input);
        let mut h = MghHeader::default();

        h.version = input.read_i32()?;
        if h.version != MGH_VERSION {
            return Err(MghError::UnsupportedVersion(h.version));
        }
        for v in &mut h.dim {
            *v = input.read_i32()?;
        }
        h.datatype = input.read_i32()?;
        h.dof = input.read_i32()?;
        h.ras_good = input.read_i16()?;
        for v in &mut h.delta {
            *v = input.read_f32()?;
        }
        for v in &mut h.mdc {
            *v = input.read_f32()?;
        }
        for v in &mut h.pxyz_c {
            *v = input.read_f32()?;
        }
        input.read_exact(&mut h.reserved)?;

        if h.dim.iter().any(|&d| d < 0) {
            return Err(MghError::InconsistentDim(h.dim));
        }
        Ok(h)
    }

    /// Write this header to the given byte sink, in the MGH layout.
    pub fn write<W: Write>(&self, output: W) -> Result<()> {
        if self.reserved.len() != RESERVED_LEN {
            return Err(MghError::InvalidFormat);
        }
        let mut output = ByteOrdered::be(output);
        output.write_i32(self.version)?;
        for v in &self.dim {
            output.write_i32(*v)?;
        }
        output.write_i32(self.datatype)?;
        output.write_i32(self.dof)?;
        output.write_i16(self.ras_good)?;
        for v in self.delta.iter().chain(&self.mdc).chain(&self.pxyz_c) {
            output.write_f32(*v)?;
        }
        output.write_all(&self.reserved)?;
        Ok(())
    }

    /// Get the storage type as a validated enum.
    pub fn data_type(&self) -> Result<MghType> {
        MghType::from_code(self.datatype)
    }

    /// Number of frames (the fourth dimension).
    pub fn frames(&self) -> usize {
        self.dim[3] as usize
    }

    /// Total number of samples declared by the header, i.e. the product
    /// of all four dimensions.
    pub fn num_voxels(&self) -> Result<usize> {
        self.dim.iter().try_fold(1usize, |acc, &d| {
            if d < 0 {
                return Err(MghError::InconsistentDim(self.dim));
            }
            acc.checked_mul(d as usize)
                .ok_or(MghError::InconsistentDim(self.dim))
        })
    }

    /// Size of the voxel payload in bytes, as declared by this header.
    pub fn payload_len(&self) -> Result<usize> {
        let n = self.num_voxels()?;
        n.checked_mul(self.data_type()?.size_of())
            .ok_or(MghError::InconsistentDim(self.dim))
    }

    /// Whether the geometry of `other` (shape, voxel sizes, direction
    /// cosines, centre and degrees of freedom) is bit-for-bit identical
    /// to this one.
    pub fn same_geometry(&self, other: &MghHeader) -> bool {
        fn bits(v: &[f32]) -> Vec<u32> {
            v.iter().map(|f| f.to_bits()).collect()
        }
        self.dim == other.dim
            && self.dof == other.dof
            && self.ras_good == other.ras_good
            && bits(&self.delta) == bits(&other.delta)
            && bits(&self.mdc) == bits(&other.mdc)
            && bits(&self.pxyz_c) == bits(&other.pxyz_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_284_bytes() {
        let mut buf = Vec::new();
        MghHeader::default().write(&mut buf).unwrap();
        assert_eq!(buf.len(), MGH_DATA_START);
    }

    #[test]
    fn write_then_read_preserves_fields() {
        let mut reserved = vec![0; RESERVED_LEN];
        reserved[0] = 0xAB;
        reserved[RESERVED_LEN - 1] = 0xCD;
        let hdr = MghHeader {
            dim: [256, 256, 128, 2],
            datatype: MghType::Float.code(),
            dof: 7,
            ras_good: 1,
            delta: [1., 1.5, 0.75],
            mdc: [-1., 0., 0., 0., 0., -1., 0., 1., 0.],
            pxyz_c: [0.25, -17.5, 3.125],
            reserved,
            ..MghHeader::default()
        };
        let mut buf = Vec::new();
        hdr.write(&mut buf).unwrap();
        let back = MghHeader::from_reader(&buf[..]).unwrap();
        assert_eq!(back, hdr);
        assert!(back.same_geometry(&hdr));
    }

    #[test]
    fn rejects_bad_version() {
        let mut buf = Vec::new();
        MghHeader::default().write(&mut buf).unwrap();
        buf[3] = 2;
        match MghHeader::from_reader(&buf[..]) {
            Err(MghError::UnsupportedVersion(2)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn rejects_short_header() {
        let mut buf = Vec::new();
        MghHeader::default().write(&mut buf).unwrap();
        buf.truncate(100);
        assert!(MghHeader::from_reader(&buf[..]).is_err());
    }

    #[test]
    fn payload_len() {
        let hdr = MghHeader {
            dim: [4, 5, 6, 2],
            datatype: MghType::Short.code(),
            ..MghHeader::default()
        };
        assert_eq!(hdr.num_voxels().unwrap(), 240);
        assert_eq!(hdr.payload_len().unwrap(), 480);
        assert_eq!(hdr.frames(), 2);
    }
}
