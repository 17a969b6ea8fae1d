//! This module defines the data element API, which enables MGH
//! volume API implementations to read, write and convert data
//! elements.
use crate::error::Result;
use crate::typedef::MghType;
use byteordered::ByteOrdered;
use num_traits::cast::AsPrimitive;
use std::fmt::Debug;
use std::io::{Read, Write};

/// Trait type for characterizing an MGH data element, implemented for
/// the primitive numeric types which are used by the crate to represent
/// voxel samples. All elements are stored big-endian.
pub trait DataElement: 'static + Sized + Copy + PartialEq + Debug + AsPrimitive<f64> {
    /// The storage type mapped to the type T
    const DATA_TYPE: MghType;

    /// Read a single element from the given byte source.
    fn from_raw<R: Read>(src: R) -> Result<Self>;

    /// Write a single element to the given byte sink.
    fn to_raw<W: Write>(self, dst: W) -> Result<()>;

    /// Transform the given big-endian byte vector into a vector of data elements.
    /// Trailing bytes which do not make a full element are ignored.
    fn from_raw_vec(vec: Vec<u8>) -> Result<Vec<Self>> {
        let n = vec.len() / Self::DATA_TYPE.size_of();
        let mut cursor: &[u8] = &vec;
        (0..n).map(|_| Self::from_raw(&mut cursor)).collect()
    }

    /// Write all elements in the slice to the given byte sink.
    fn write_all<W: Write>(data: &[Self], mut dst: W) -> Result<()> {
        for v in data {
            v.to_raw(&mut dst)?;
        }
        Ok(())
    }
}

impl DataElement for u8 {
    const DATA_TYPE: MghType = MghType::Uchar;
    fn from_raw_vec(vec: Vec<u8>) -> Result<Vec<Self>> {
        Ok(vec)
    }
    fn from_raw<R: Read>(src: R) -> Result<Self> {
        ByteOrdered::be(src).read_u8().map_err(From::from)
    }
    fn to_raw<W: Write>(self, dst: W) -> Result<()> {
        ByteOrdered::be(dst).write_u8(self).map_err(From::from)
    }
    fn write_all<W: Write>(data: &[Self], mut dst: W) -> Result<()> {
        dst.write_all(data).map_err(From::from)
    }
}

impl DataElement for i16 {
    const DATA_TYPE: MghType = MghType::Short;
    fn from_raw<R: Read>(src: R) -> Result<Self> {
        ByteOrdered::be(src).read_i16().map_err(From::from)
    }
    fn to_raw<W: Write>(self, dst: W) -> Result<()> {
        ByteOrdered::be(dst).write_i16(self).map_err(From::from)
    }
}

impl DataElement for i32 {
    const DATA_TYPE: MghType = MghType::Int;
    fn from_raw<R: Read>(src: R) -> Result<Self> {
        ByteOrdered::be(src).read_i32().map_err(From::from)
    }
    fn to_raw<W: Write>(self, dst: W) -> Result<()> {
        ByteOrdered::be(dst).write_i32(self).map_err(From::from)
    }
}

impl DataElement for f32 {
    const DATA_TYPE: MghType = MghType::Float;
    fn from_raw<R: Read>(src: R) -> Result<Self> {
        ByteOrdered::be(src).read_f32().map_err(From::from)
    }
    fn to_raw<W: Write>(self, dst: W) -> Result<()> {
        ByteOrdered::be(dst).write_f32(self).map_err(From::from)
    }
}

#[cfg(test)]
mod tests {
    use super::DataElement;

    #[test]
    fn big_endian_decoding() {
        let raw = vec![0x01, 0x02, 0xFF, 0xFE];
        assert_eq!(i16::from_raw_vec(raw.clone()).unwrap(), vec![0x0102, -2]);
        assert_eq!(i32::from_raw_vec(raw.clone()).unwrap(), vec![0x0102_FFFE]);
        assert_eq!(u8::from_raw_vec(raw).unwrap(), vec![1, 2, 255, 254]);

        let raw = 1.5f32.to_be_bytes().to_vec();
        assert_eq!(f32::from_raw_vec(raw).unwrap(), vec![1.5]);
    }

    #[test]
    fn big_endian_encoding() {
        let mut out = Vec::new();
        i16::write_all(&[-500, 500], &mut out).unwrap();
        assert_eq!(out, vec![0xFE, 0x0C, 0x01, 0xF4]);

        let mut out = Vec::new();
        i32::write_all(&[1], &mut out).unwrap();
        assert_eq!(out, vec![0, 0, 0, 1]);
    }
}
