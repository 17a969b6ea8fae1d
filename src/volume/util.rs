//! Miscellaneous volume-related functions
use crate::error::{MghError, Result};

/// Convert voxel coordinates (column-major, fastest axis first) into a
/// linear sample index.
pub fn coords_to_index(coords: &[usize; 4], dim: &[usize; 4]) -> Result<usize> {
    if !coords.iter().zip(dim).all(|(i, d)| i < d) {
        return Err(MghError::InconsistentDim([
            coords[0] as i32,
            coords[1] as i32,
            coords[2] as i32,
            coords[3] as i32,
        ]));
    }

    let index = coords
        .iter()
        .zip(dim)
        .rev()
        .fold(0, |a, (c, d)| a * d + c);

    Ok(index)
}
