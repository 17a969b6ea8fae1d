//! Detection of volumes whose samples are all integers.
//!
//! Integer storage types are integral by construction. Floating point
//! samples are integral if each one lies within a tolerance of its nearest
//! integer; analysis stops at the first sample which does not.

use crate::volume::VoxelData;

/// The kind of non-finite sample found in a volume.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum NonFinite {
    /// Not a number
    NaN,
    /// Positive infinity
    PosInfinity,
    /// Negative infinity
    NegInfinity,
}

/// Outcome of the integrality analysis of a volume.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Integrality {
    /// Every sample is an integer. The bounds are those of the samples
    /// rounded to the nearest integer; an empty volume has bounds `[0, 0]`.
    /// Bounds beyond the `i64` range saturate.
    Integral {
        /// Smallest sample
        min: i64,
        /// Largest sample
        max: i64,
    },
    /// A sample with a fractional part larger than the tolerance was found.
    Fractional {
        /// Linear index of the first offending sample
        index: usize,
        /// The sample's value
        value: f64,
        /// Distance from the sample to its nearest integer
        deviation: f64,
    },
    /// A NaN or infinite sample was found.
    NonFinite {
        /// Linear index of the first offending sample
        index: usize,
        /// What was found
        kind: NonFinite,
    },
}

impl Integrality {
    /// Whether the volume was found to be integral.
    pub fn is_integral(&self) -> bool {
        matches!(self, Integrality::Integral { .. })
    }

    /// The integer bounds of the samples, if integral.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match *self {
            Integrality::Integral { min, max } => Some((min, max)),
            _ => None,
        }
    }
}

/// Decide whether every sample is an integer, within `tolerance`.
/// A negative or NaN tolerance is taken as 0.
pub fn analyze(data: &VoxelData, tolerance: f64) -> Integrality {
    match data {
        VoxelData::Uchar(v) => integer_bounds(v),
        VoxelData::Short(v) => integer_bounds(v),
        VoxelData::Int(v) => integer_bounds(v),
        VoxelData::Float(v) => float_bounds(v, tolerance.max(0.)),
    }
}

fn integer_bounds<T>(data: &[T]) -> Integrality
where
    T: Copy + Into<i64>,
{
    let mut it = data.iter().map(|&x| x.into());
    let first = match it.next() {
        Some(x) => x,
        None => return Integrality::Integral { min: 0, max: 0 },
    };
    let (min, max) = it.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
    Integrality::Integral { min, max }
}

fn float_bounds(data: &[f32], tolerance: f64) -> Integrality {
    if data.is_empty() {
        return Integrality::Integral { min: 0, max: 0 };
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (index, &x) in data.iter().enumerate() {
        if !x.is_finite() {
            let kind = if x.is_nan() {
                NonFinite::NaN
            } else if x > 0. {
                NonFinite::PosInfinity
            } else {
                NonFinite::NegInfinity
            };
            return Integrality::NonFinite { index, kind };
        }
        let value = f64::from(x);
        let rounded = value.round();
        let deviation = (value - rounded).abs();
        if deviation > tolerance {
            return Integrality::Fractional {
                index,
                value,
                deviation,
            };
        }
        min = min.min(rounded);
        max = max.max(rounded);
    }
    // float to int casts saturate
    Integrality::Integral {
        min: min as i64,
        max: max as i64,
    }
}
