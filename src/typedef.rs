//! This module contains the storage types defined by the MGH format.
//! `MghType` identifies how voxel samples are laid out in the payload,
//! and also carries the value range used when narrowing volumes.

use crate::error::{MghError, Result};
use num_traits::FromPrimitive;

/// Data type for representing an MGH storage type in a volume.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum MghType {
    /// unsigned char.
    // MRI_UCHAR    0
    Uchar = 0,
    /// signed short.
    // MRI_SHORT    4
    Short = 4,
    /// signed int.
    // MRI_INT      1
    Int = 1,
    /// 32 bit float.
    // MRI_FLOAT    3
    Float = 3,
}

/// The integer storage types, from narrowest to widest.
pub const INTEGER_TYPES: [MghType; 3] = [MghType::Uchar, MghType::Short, MghType::Int];

impl MghType {
    /// Validate a raw storage type code, as found in the header.
    pub fn from_code(code: i32) -> Result<MghType> {
        FromPrimitive::from_i32(code).ok_or(MghError::UnsupportedDataType(code))
    }

    /// The raw code written to the header.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        match self {
            MghType::Uchar => 1,
            MghType::Short => 2,
            MghType::Int | MghType::Float => 4,
        }
    }

    /// Whether samples of this type are always integers.
    pub fn is_integer(self) -> bool {
        self != MghType::Float
    }

    /// The inclusive range of integer values representable by this type,
    /// or `None` for floating point storage.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            MghType::Uchar => Some((u8::MIN.into(), u8::MAX.into())),
            MghType::Short => Some((i16::MIN.into(), i16::MAX.into())),
            MghType::Int => Some((i32::MIN.into(), i32::MAX.into())),
            MghType::Float => None,
        }
    }

    /// Whether every integer in `[min, max]` is representable by this type.
    pub fn contains_range(self, min: i64, max: i64) -> bool {
        match self.integer_range() {
            Some((lo, hi)) => lo <= min && max <= hi,
            None => false,
        }
    }
}
