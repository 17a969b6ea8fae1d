//! Types for error handling go here.
use crate::typedef::MghType;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum MghError {
        /// An invalid MGH file was read
        InvalidFormat {
            display("Invalid MGH file")
        }
        /// The header declares a format version other than 1
        UnsupportedVersion(version: i32) {
            display("Unsupported MGH format version {}", version)
        }
        /// The header declares a storage type code which is not supported
        UnsupportedDataType(code: i32) {
            display("Unsupported storage type code {}", code)
        }
        /// The header declares an invalid volume shape
        InconsistentDim(dim: [i32; 4]) {
            display("Inconsistent volume shape {:?}", dim)
        }
        /// The voxel payload ended before all samples were read
        TruncatedPayload(expected: usize, got: usize) {
            display("Voxel payload truncated: expected {} bytes, got {}", expected, got)
        }
        /// A tagged record in the trailer has an invalid length
        InvalidTag(tag: i32, len: i64) {
            display("Invalid tag {} with length {}", tag, len)
        }
        /// The samples cannot be represented in the requested storage type
        IncompatibleData(from: MghType, to: MghType) {
            display("Samples of type {:?} cannot be stored as {:?} without loss", from, to)
        }
        /// Failed to load a label reference pattern
        InvalidPattern(entry: String, err: glob::PatternError) {
            display("Invalid label reference pattern {:?}: {}", entry, err)
            source(err)
        }
        /// Another file of the same batch is written to this path
        DuplicateOutput(path: PathBuf) {
            display("Output path {} is already taken by another input", path.display())
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
    }
}

impl From<tempfile::PersistError> for MghError {
    fn from(e: tempfile::PersistError) -> Self {
        MghError::Io(e.error)
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, MghError>;
