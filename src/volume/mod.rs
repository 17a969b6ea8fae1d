//! This module defines the voxel volume API, as well as the in-memory
//! volume type holding the samples of an MGH file.
//!
//! Samples are kept in their declared storage type (see [`VoxelData`]),
//! so no precision is lost between reading a file and analysing it.
//!
//! [`VoxelData`]: ./enum.VoxelData.html

pub mod element;
mod util;

pub use self::element::DataElement;
use self::util::coords_to_index;
use crate::error::{MghError, Result};
use crate::header::MghHeader;
use crate::typedef::MghType;
use std::convert::TryFrom;
use std::io::{Read, Write};

/// Public API for MGH volume data, exposed as a four-dimensional
/// voxel array.
pub trait MghVolume {
    /// Get the dimensions of the volume: width, height, depth and frames.
    fn dim(&self) -> &[usize; 4];

    /// Get this volume's storage type.
    fn data_type(&self) -> MghType;

    /// Fetch a single voxel's value in the given voxel index coordinates
    /// as a double precision floating point value. Every supported storage
    /// type converts to `f64` exactly.
    ///
    /// # Errors
    ///
    /// - `MghError::InconsistentDim` if the given coordinates surpass this
    /// volume's boundaries.
    fn get_f64(&self, coords: &[usize; 4]) -> Result<f64>;

    /// Total number of samples in the volume.
    fn num_voxels(&self) -> usize {
        self.dim().iter().product()
    }
}

/// The samples of a volume, in their storage type.
#[derive(Debug, PartialEq, Clone)]
pub enum VoxelData {
    /// `MRI_UCHAR` samples
    Uchar(Vec<u8>),
    /// `MRI_SHORT` samples
    Short(Vec<i16>),
    /// `MRI_INT` samples
    Int(Vec<i32>),
    /// `MRI_FLOAT` samples
    Float(Vec<f32>),
}

impl VoxelData {
    /// Decode a big-endian payload of the given storage type.
    pub fn from_raw_vec(datatype: MghType, raw: Vec<u8>) -> Result<VoxelData> {
        Ok(match datatype {
            MghType::Uchar => VoxelData::Uchar(u8::from_raw_vec(raw)?),
            MghType::Short => VoxelData::Short(i16::from_raw_vec(raw)?),
            MghType::Int => VoxelData::Int(i32::from_raw_vec(raw)?),
            MghType::Float => VoxelData::Float(f32::from_raw_vec(raw)?),
        })
    }

    /// The storage type of these samples.
    pub fn data_type(&self) -> MghType {
        match self {
            VoxelData::Uchar(_) => MghType::Uchar,
            VoxelData::Short(_) => MghType::Short,
            VoxelData::Int(_) => MghType::Int,
            VoxelData::Float(_) => MghType::Float,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            VoxelData::Uchar(v) => v.len(),
            VoxelData::Short(v) => v.len(),
            VoxelData::Int(v) => v.len(),
            VoxelData::Float(v) => v.len(),
        }
    }

    /// Whether there are no samples at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the encoded payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.data_type().size_of()
    }

    /// Fetch the sample at the given linear index as `f64`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            VoxelData::Uchar(v) => v.get(index).map(|&x| f64::from(x)),
            VoxelData::Short(v) => v.get(index).map(|&x| f64::from(x)),
            VoxelData::Int(v) => v.get(index).map(|&x| f64::from(x)),
            VoxelData::Float(v) => v.get(index).map(|&x| f64::from(x)),
        }
    }

    /// Write the samples to the given sink, big-endian.
    pub fn write<W: Write>(&self, dst: W) -> Result<()> {
        match self {
            VoxelData::Uchar(v) => u8::write_all(v, dst),
            VoxelData::Short(v) => i16::write_all(v, dst),
            VoxelData::Int(v) => i32::write_all(v, dst),
            VoxelData::Float(v) => f32::write_all(v, dst),
        }
    }

    /// Losslessly re-encode the samples into another storage type.
    ///
    /// Floating point samples are rounded to the nearest integer when the
    /// target is an integer type, so callers must establish integrality
    /// beforehand. Any sample outside the target's range, as well as any
    /// non-finite sample, makes the whole conversion fail and leaves the
    /// data untouched.
    pub fn convert_to(&self, target: MghType) -> Result<VoxelData> {
        let source = self.data_type();
        if source == target {
            return Ok(self.clone());
        }
        let incompatible = || MghError::IncompatibleData(source, target);
        match target {
            MghType::Uchar => self.try_map(|x| u8::try_from(x).ok(), incompatible).map(VoxelData::Uchar),
            MghType::Short => self.try_map(|x| i16::try_from(x).ok(), incompatible).map(VoxelData::Short),
            MghType::Int => self.try_map(|x| i32::try_from(x).ok(), incompatible).map(VoxelData::Int),
            MghType::Float => {
                // every integer up to 2^24 in magnitude is exact in f32
                const EXACT: i64 = 1 << 24;
                self.try_map(
                    |x| if (-EXACT..=EXACT).contains(&x) { Some(x as f32) } else { None },
                    incompatible,
                )
                .map(VoxelData::Float)
            }
        }
    }

    /// Apply a fallible conversion to each sample taken as an integer.
    fn try_map<T, F, E>(&self, f: F, err: E) -> Result<Vec<T>>
    where
        F: Fn(i64) -> Option<T>,
        E: Fn() -> MghError,
    {
        match self {
            VoxelData::Uchar(v) => v.iter().map(|&x| f(x.into()).ok_or_else(&err)).collect(),
            VoxelData::Short(v) => v.iter().map(|&x| f(x.into()).ok_or_else(&err)).collect(),
            VoxelData::Int(v) => v.iter().map(|&x| f(x.into()).ok_or_else(&err)).collect(),
            VoxelData::Float(v) => v
                .iter()
                .map(|&x| {
                    if !x.is_finite() {
                        return Err(err());
                    }
                    let r = f64::from(x).round();
                    if r < i64::MIN as f64 || r >= i64::MAX as f64 {
                        return Err(err());
                    }
                    f(r as i64).ok_or_else(&err)
                })
                .collect(),
        }
    }
}

/// A data type for an MGH volume contained in memory.
#[derive(Debug, PartialEq, Clone)]
pub struct InMemMghVolume {
    dim: [usize; 4],
    data: VoxelData,
}

impl InMemMghVolume {
    /// Create a volume out of its shape and samples.
    ///
    /// # Errors
    ///
    /// - `MghError::InconsistentDim` if the number of samples does not match
    /// the shape.
    pub fn new(dim: [usize; 4], data: VoxelData) -> Result<Self> {
        let expected: usize = dim.iter().product();
        if data.len() != expected {
            return Err(MghError::InconsistentDim([
                dim[0] as i32,
                dim[1] as i32,
                dim[2] as i32,
                dim[3] as i32,
            ]));
        }
        Ok(InMemMghVolume { dim, data })
    }

    /// Read an MGH volume from a stream of data. The header must be known
    /// in advance, and the source must be positioned at the first sample.
    pub fn from_reader<R: Read>(source: R, header: &MghHeader) -> Result<Self> {
        let datatype = header.data_type()?;
        let nbytes = header.payload_len()?;
        // the declared size is untrusted until the bytes are there
        let mut raw_data = Vec::with_capacity(nbytes.min(1 << 24));
        let got = source.take(nbytes as u64).read_to_end(&mut raw_data)?;
        if got != nbytes {
            return Err(MghError::TruncatedPayload(nbytes, got));
        }
        let mut dim = [0; 4];
        for (d, h) in dim.iter_mut().zip(&header.dim) {
            *d = *h as usize;
        }
        Self::new(dim, VoxelData::from_raw_vec(datatype, raw_data)?)
    }

    /// Obtain a reference to the samples.
    pub fn data(&self) -> &VoxelData {
        &self.data
    }

    /// Move the samples out of the volume.
    pub fn into_data(self) -> VoxelData {
        self.data
    }

    /// Replace the samples with a re-encoded version of themselves. The
    /// shape never changes, so the new data must hold the same number
    /// of samples.
    pub fn set_data(&mut self, data: VoxelData) -> Result<()> {
        let vol = InMemMghVolume::new(self.dim, data)?;
        *self = vol;
        Ok(())
    }
}

impl MghVolume for InMemMghVolume {
    fn dim(&self) -> &[usize; 4] {
        &self.dim
    }

    fn data_type(&self) -> MghType {
        self.data.data_type()
    }

    fn get_f64(&self, coords: &[usize; 4]) -> Result<f64> {
        let index = coords_to_index(coords, &self.dim)?;
        self.data
            .get_f64(index)
            .ok_or(MghError::InconsistentDim([
                coords[0] as i32,
                coords[1] as i32,
                coords[2] as i32,
                coords[3] as i32,
            ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_conversions() {
        let data = VoxelData::Float(vec![0., 1., 255.]);
        assert_eq!(
            data.convert_to(MghType::Uchar).unwrap(),
            VoxelData::Uchar(vec![0, 1, 255])
        );
        let data = VoxelData::Int(vec![-500, 0, 500]);
        assert_eq!(
            data.convert_to(MghType::Short).unwrap(),
            VoxelData::Short(vec![-500, 0, 500])
        );
        assert!(data.convert_to(MghType::Uchar).is_err());
    }

    #[test]
    fn non_finite_samples_never_convert() {
        let data = VoxelData::Float(vec![0., f32::NAN]);
        assert!(data.convert_to(MghType::Int).is_err());
        let data = VoxelData::Float(vec![f32::INFINITY]);
        assert!(data.convert_to(MghType::Int).is_err());
    }

    #[test]
    fn widening_to_float_must_be_exact() {
        let data = VoxelData::Int(vec![1 << 24, -(1 << 24)]);
        assert!(data.convert_to(MghType::Float).is_ok());
        let data = VoxelData::Int(vec![(1 << 24) + 1]);
        assert!(data.convert_to(MghType::Float).is_err());
    }

    #[test]
    fn volume_shape_must_match() {
        assert!(InMemMghVolume::new([2, 2, 1, 1], VoxelData::Uchar(vec![0; 4])).is_ok());
        assert!(InMemMghVolume::new([2, 2, 1, 1], VoxelData::Uchar(vec![0; 5])).is_err());
        let mut vol = InMemMghVolume::new([2, 1, 1, 1], VoxelData::Int(vec![3, 4])).unwrap();
        assert!(vol.set_data(VoxelData::Uchar(vec![3])).is_err());
        vol.set_data(VoxelData::Uchar(vec![3, 4])).unwrap();
        assert_eq!(vol.data_type(), MghType::Uchar);
        assert_eq!(vol.get_f64(&[1, 0, 0, 0]).unwrap(), 4.);
    }

    #[test]
    fn read_truncated_payload() {
        let hdr = MghHeader {
            dim: [4, 1, 1, 1],
            datatype: MghType::Short.code(),
            ..MghHeader::default()
        };
        let raw = [0u8; 6];
        match InMemMghVolume::from_reader(&raw[..], &hdr) {
            Err(MghError::TruncatedPayload(8, 6)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
}
