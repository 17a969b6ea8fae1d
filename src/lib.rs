//! Lossless optimization of MGH/MGZ neuroimaging volumes.
//!
//! This crate rewrites volumes in the MGH format (and its Gzip-compressed
//! variant MGZ) into a smaller representation, without changing a single
//! sample value:
//!
//! - volumes whose samples are all integers are re-encoded into the
//!   narrowest integer storage type able to hold them;
//! - volumes holding label (segmentation) data are tagged with the label
//!   intent code, so that viewers can render them categorically.
//!
//! Header geometry, acquisition parameters and unrelated trailer records
//! are carried over byte for byte.
//!
//! # Example
//!
//! ```no_run
//! use mgz_optimize::{optimize_file, LabelReference, OptimizeOptions};
//!
//! let reference = LabelReference::freesurfer();
//! let outcome = optimize_file("aseg.mgz", &OptimizeOptions::new(), &reference)?;
//! println!("{:?} -> {:?}", outcome.original_type, outcome.new_type);
//! # Ok::<(), mgz_optimize::FileFailure>(())
//! ```
//!
//! The building blocks of the pipeline ([`integrality`], [`narrow`],
//! [`label`] and [`intent`]) can also be used on their own, over objects
//! read with [`MghObject`].
//!
//! [`integrality`]: ./integrality/index.html
//! [`narrow`]: ./narrow/index.html
//! [`label`]: ./label/index.html
//! [`intent`]: ./intent/index.html
//! [`MghObject`]: ./object/struct.MghObject.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod error;
pub mod header;
pub mod integrality;
pub mod intent;
pub mod label;
pub mod narrow;
pub mod object;
pub mod optimize;
pub mod options;
pub mod tag;
pub mod typedef;
mod util;
pub mod volume;
pub mod writer;

pub use crate::error::{MghError, Result};
pub use crate::header::MghHeader;
pub use crate::integrality::Integrality;
pub use crate::intent::{Intent, IntentCode, IntentPolicy, IntentTable};
pub use crate::label::{HeuristicParams, LabelBasis, LabelDecision, LabelReference};
pub use crate::narrow::Narrowing;
pub use crate::object::MghObject;
pub use crate::optimize::{
    optimize_file, optimize_object, run_batch, run_batch_with_cancel, BatchReport, FailureKind,
    FileFailure, Outcome,
};
#[cfg(feature = "parallel")]
pub use crate::optimize::run_batch_parallel;
pub use crate::options::{OptimizeOptions, OutputPolicy};
pub use crate::tag::Trailer;
pub use crate::typedef::MghType;
pub use crate::volume::{InMemMghVolume, MghVolume, VoxelData};
pub use crate::writer::WriterOptions;
