//! Selection of the narrowest storage type able to hold a value range.

use crate::typedef::{MghType, INTEGER_TYPES};

/// Outcome of storage type selection for an integral volume.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Narrowing {
    /// A narrower type holds every sample.
    Narrowed {
        /// The type the volume was stored in
        from: MghType,
        /// The type the volume should be stored in
        to: MghType,
    },
    /// The current type is already the narrowest one.
    AlreadyMinimal(MghType),
    /// No supported integer type can hold the range; the current type
    /// is kept.
    Impossible {
        /// The type the volume stays in
        current: MghType,
        /// Smallest sample
        min: i64,
        /// Largest sample
        max: i64,
    },
}

impl Narrowing {
    /// The storage type the volume ends up in.
    pub fn target(&self) -> MghType {
        match *self {
            Narrowing::Narrowed { to, .. } => to,
            Narrowing::AlreadyMinimal(t) => t,
            Narrowing::Impossible { current, .. } => current,
        }
    }

    /// Whether the volume needs to be re-encoded.
    pub fn changes_type(&self) -> bool {
        matches!(self, Narrowing::Narrowed { .. })
    }
}

/// Position of a storage type in the narrowing order: every integer type
/// comes before floating point, and integer types go by byte width.
fn rank(t: MghType) -> usize {
    INTEGER_TYPES
        .iter()
        .position(|&i| i == t)
        .unwrap_or(INTEGER_TYPES.len())
}

/// Pick the narrowest integer type whose range contains `[min, max]`.
///
/// The current type is kept when it already is that type, or when it comes
/// earlier in the narrowing order. A range which fits no integer type at
/// all yields `Narrowing::Impossible`. Applying this function to its own
/// output is a no-op.
pub fn narrowest_type(min: i64, max: i64, current: MghType) -> Narrowing {
    let candidate = INTEGER_TYPES
        .iter()
        .copied()
        .find(|t| t.contains_range(min, max));
    match candidate {
        None => Narrowing::Impossible { current, min, max },
        Some(t) if rank(t) < rank(current) => Narrowing::Narrowed {
            from: current,
            to: t,
        },
        Some(_) => Narrowing::AlreadyMinimal(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_range_goes_to_uchar() {
        assert_eq!(
            narrowest_type(0, 255, MghType::Float),
            Narrowing::Narrowed {
                from: MghType::Float,
                to: MghType::Uchar
            }
        );
        assert_eq!(narrowest_type(0, 255, MghType::Int).target(), MghType::Uchar);
    }

    #[test]
    fn negative_values_skip_uchar() {
        assert_eq!(narrowest_type(-500, 500, MghType::Int).target(), MghType::Short);
        assert_eq!(narrowest_type(-1, 0, MghType::Float).target(), MghType::Short);
    }

    #[test]
    fn float_to_int_of_same_width() {
        assert_eq!(
            narrowest_type(0, 100_000, MghType::Float),
            Narrowing::Narrowed {
                from: MghType::Float,
                to: MghType::Int
            }
        );
    }

    #[test]
    fn already_minimal_is_a_fixed_point() {
        for &(min, max) in &[(0, 255), (-500, 500), (0, 100_000), (0, 0)] {
            let first = narrowest_type(min, max, MghType::Float).target();
            let second = narrowest_type(min, max, first);
            assert_eq!(second, Narrowing::AlreadyMinimal(first));
            assert!(!second.changes_type());
        }
    }

    #[test]
    fn range_beyond_int_is_impossible() {
        let max = i64::from(i32::MAX) + 1;
        assert_eq!(
            narrowest_type(0, max, MghType::Float),
            Narrowing::Impossible {
                current: MghType::Float,
                min: 0,
                max
            }
        );
        assert_eq!(narrowest_type(i64::MIN, 0, MghType::Float).target(), MghType::Float);
    }

    #[test]
    fn never_excludes_observed_values() {
        let ranges = [(0, 0), (0, 255), (0, 256), (-1, 1), (-32768, 32767), (-32769, 0)];
        for &(min, max) in &ranges {
            let t = narrowest_type(min, max, MghType::Float).target();
            assert!(t.contains_range(min, max), "{:?} for {}..={}", t, min, max);
        }
    }
}
