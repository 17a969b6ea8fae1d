//! The optimization pipeline: integrality analysis, storage narrowing,
//! label classification and intent tagging, for one file or a batch.
//!
//! Each file is read, processed and written on its own. A file which
//! cannot be read or written is recorded as a [`FileFailure`] and the
//! batch moves on to the next one.
//!
//! # Example
//!
//! ```no_run
//! use mgz_optimize::{run_batch, LabelReference, OptimizeOptions};
//!
//! let reference = LabelReference::freesurfer();
//! let options = OptimizeOptions::new().output_dir("out");
//! let report = run_batch(&["mri/aseg.mgz", "mri/T1.mgz"], &options, &reference);
//! for failure in report.failures() {
//!     eprintln!("{}", failure);
//! }
//! ```
//!
//! [`FileFailure`]: ./struct.FileFailure.html

use crate::error::{MghError, Result};
use crate::integrality::{analyze, Integrality};
use crate::intent::{describe, IntentChange, IntentCode, IntentTagger};
use crate::label::{LabelBasis, LabelClassifier, LabelDecision, LabelReference};
use crate::narrow::{narrowest_type, Narrowing};
use crate::object::MghObject;
use crate::options::OptimizeOptions;
use crate::typedef::MghType;
use crate::writer::WriterOptions;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// What happened to the storage type of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowingStep {
    /// Narrowing was attempted, with this outcome.
    Applied(Narrowing),
    /// Narrowing is disabled in the options.
    Disabled,
    /// The samples are not all integers.
    NotIntegral,
}

impl NarrowingStep {
    /// The narrowing outcome, if narrowing was attempted.
    pub fn narrowing(&self) -> Option<Narrowing> {
        match *self {
            NarrowingStep::Applied(n) => Some(n),
            _ => None,
        }
    }
}

/// What happened during label classification of a volume.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelStep {
    /// The volume was classified.
    Classified(LabelDecision),
    /// Classification was skipped because the samples are not integers.
    NotIntegral,
    /// The intent policy does not depend on classification.
    NotRequested,
}

impl LabelStep {
    /// The label decision, if the volume was classified.
    pub fn decision(&self) -> Option<&LabelDecision> {
        match self {
            LabelStep::Classified(d) => Some(d),
            _ => None,
        }
    }
}

/// Every decision taken while optimizing one volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Decisions {
    /// Result of the integrality analysis
    pub integrality: Integrality,
    /// Storage type selection
    pub narrowing: NarrowingStep,
    /// Label classification
    pub label: LabelStep,
    /// Intent record before and after
    pub intent: IntentChange,
}

/// Run the pipeline over an object in memory. Only the samples, the
/// storage type and the intent record are modified. `identifier` names
/// the volume for the label reference; only its file name is used.
///
/// An error means the samples could not be re-encoded, and leaves the
/// object untouched.
pub fn optimize_object<P: AsRef<Path>>(
    object: &mut MghObject,
    identifier: P,
    options: &OptimizeOptions,
    reference: &LabelReference,
) -> Result<Decisions> {
    let identifier = identifier.as_ref();
    let integrality = analyze(object.volume().data(), options.get_tolerance());
    debug!(path = %identifier.display(), ?integrality, "integrality analysis");

    let narrowing = match integrality {
        Integrality::Integral { min, max } if options.get_narrowing() => {
            let n = narrowest_type(min, max, object.data_type());
            if let Narrowing::Narrowed { to, .. } = n {
                let data = object.volume().data().convert_to(to)?;
                object.set_data(data)?;
            } else if let Narrowing::Impossible { .. } = n {
                warn!(path = %identifier.display(), min, max, "no integer type holds the sample range");
            }
            NarrowingStep::Applied(n)
        }
        Integrality::Integral { .. } => NarrowingStep::Disabled,
        _ => NarrowingStep::NotIntegral,
    };

    let policy = options.get_intent_policy();
    let label = if !policy.needs_classification() {
        LabelStep::NotRequested
    } else if integrality.is_integral() || options.get_classify_non_integral() {
        let classifier = LabelClassifier::new(reference, *options.get_heuristic());
        let decision = classifier.classify(identifier, object.volume().data());
        if decision.is_ambiguous() {
            warn!(
                path = %identifier.display(),
                is_label = decision.is_label,
                basis = ?decision.basis,
                "label classification is borderline"
            );
        }
        LabelStep::Classified(decision)
    } else {
        LabelStep::NotIntegral
    };

    let tagger = IntentTagger::new(object.intent().map(IntentCode));
    let is_label = label.decision().map(|d| d.is_label);
    let intent = tagger.resolve(policy, is_label, options.get_intent_table());
    if let (true, Some(code)) = (intent.changed(), intent.after) {
        object.set_intent(code.0);
    }
    debug!(
        path = %identifier.display(),
        ?narrowing,
        ?label,
        before = %describe(intent.before),
        after = %describe(intent.after),
        "decisions"
    );

    Ok(Decisions {
        integrality,
        narrowing,
        label,
        intent,
    })
}

/// The record of a successfully optimized file.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// File read
    pub input: PathBuf,
    /// File written
    pub output: PathBuf,
    /// Storage type of the input
    pub original_type: MghType,
    /// Storage type of the output
    pub new_type: MghType,
    /// How the output was decided
    pub decisions: Decisions,
    /// Size of the output file on disk
    pub bytes_written: u64,
}

impl Outcome {
    /// Whether the volume was classified as label data, if classified.
    pub fn is_label(&self) -> Option<bool> {
        self.decisions.label.decision().map(|d| d.is_label)
    }

    /// Why the volume was or was not classified as label data.
    pub fn label_basis(&self) -> Option<&LabelBasis> {
        self.decisions.label.decision().map(|d| &d.basis)
    }
}

/// Stage at which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The input could not be read or its samples re-encoded.
    MalformedVolume,
    /// The output could not be written.
    WriteFailure,
}

/// The record of a file which could not be optimized.
#[derive(Debug)]
pub struct FileFailure {
    /// File read
    pub path: PathBuf,
    /// Failing stage
    pub kind: FailureKind,
    /// Cause
    pub error: MghError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stage = match self.kind {
            FailureKind::MalformedVolume => "malformed volume",
            FailureKind::WriteFailure => "write failure",
        };
        write!(f, "{}: {}: {}", self.path.display(), stage, self.error)
    }
}

impl Error for FileFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Read, optimize and write one file, at the path given by the options'
/// output policy. The volume is released before returning.
pub fn optimize_file<P: AsRef<Path>>(
    input: P,
    options: &OptimizeOptions,
    reference: &LabelReference,
) -> ::std::result::Result<Outcome, FileFailure> {
    let input = input.as_ref();
    let fail = |kind, error| FileFailure {
        path: input.to_owned(),
        kind,
        error,
    };

    let mut object = MghObject::from_file(input).map_err(|e| fail(FailureKind::MalformedVolume, e))?;
    let original_type = object.data_type();
    let decisions = optimize_object(&mut object, input, options, reference)
        .map_err(|e| fail(FailureKind::MalformedVolume, e))?;

    let output = options.get_output().resolve(input);
    if options.get_output().creates_parents() {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(FailureKind::WriteFailure, e.into()))?;
        }
    }
    let mut writer = WriterOptions::new(&output);
    if let Ok(meta) = fs::metadata(input) {
        writer = writer.permissions(meta.permissions());
    }
    if let Some(level) = options.get_compression_level() {
        writer = writer.compression_level(level);
    }
    let bytes_written = writer
        .write_object(&object)
        .map_err(|e| fail(FailureKind::WriteFailure, e))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        from = ?original_type,
        to = ?object.data_type(),
        intent = %describe(decisions.intent.after),
        bytes_written,
        "volume written"
    );

    Ok(Outcome {
        input: input.to_owned(),
        output,
        original_type,
        new_type: object.data_type(),
        decisions,
        bytes_written,
    })
}

/// Per-file results of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per processed file
    pub results: Vec<::std::result::Result<Outcome, FileFailure>>,
    /// Whether the batch was stopped before processing every file
    pub cancelled: bool,
}

impl BatchReport {
    /// Successfully optimized files.
    pub fn successes(&self) -> impl Iterator<Item = &Outcome> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    /// Files which could not be optimized.
    pub fn failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    /// Whether every file was processed and none failed.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.results.iter().all(|r| r.is_ok())
    }

    /// Number of processed files.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no file was processed.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn push(&mut self, result: ::std::result::Result<Outcome, FileFailure>) {
        if let Err(failure) = &result {
            warn!(path = %failure.path.display(), kind = ?failure.kind, error = %failure.error, "file skipped");
        }
        self.results.push(result);
    }
}

/// Output paths already assigned within a batch.
#[derive(Debug, Default)]
struct OutputClaims(HashSet<PathBuf>);

impl OutputClaims {
    /// Reserve the output path of `input`, or fail if an earlier input
    /// of the batch already writes there.
    fn claim(&mut self, input: &Path, options: &OptimizeOptions) -> Option<FileFailure> {
        let output = options.get_output().resolve(input);
        if self.0.contains(&output) {
            return Some(FileFailure {
                path: input.to_owned(),
                kind: FailureKind::WriteFailure,
                error: MghError::DuplicateOutput(output),
            });
        }
        let _ = self.0.insert(output);
        None
    }
}

/// Optimize every file in turn. A failing file never stops the batch.
/// An input whose output path is already taken by an earlier input is
/// recorded as a failure and left alone.
pub fn run_batch<I, P>(paths: I, options: &OptimizeOptions, reference: &LabelReference) -> BatchReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    run_batch_with_cancel(paths, options, reference, &AtomicBool::new(false))
}

/// Optimize every file in turn, until `cancel` is set. The flag is only
/// checked between files; a file being processed is always completed.
pub fn run_batch_with_cancel<I, P>(
    paths: I,
    options: &OptimizeOptions,
    reference: &LabelReference,
    cancel: &AtomicBool,
) -> BatchReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = BatchReport::default();
    let mut claims = OutputClaims::default();
    for path in paths {
        if cancel.load(Ordering::SeqCst) {
            info!(processed = report.len(), "batch cancelled");
            report.cancelled = true;
            break;
        }
        let result = match claims.claim(path.as_ref(), options) {
            Some(failure) => Err(failure),
            None => optimize_file(path, options, reference),
        };
        report.push(result);
    }
    report
}

/// Optimize files on the global `rayon` thread pool. Results are kept in
/// input order, and output paths are assigned as in `run_batch`.
#[cfg(feature = "parallel")]
pub fn run_batch_parallel<P>(paths: &[P], options: &OptimizeOptions, reference: &LabelReference) -> BatchReport
where
    P: AsRef<Path> + Sync,
{
    use rayon::prelude::*;

    let mut claims = OutputClaims::default();
    let pending: Vec<_> = paths
        .iter()
        .map(|p| (p, claims.claim(p.as_ref(), options)))
        .collect();
    let results: Vec<_> = pending
        .into_par_iter()
        .map(|(p, duplicate)| match duplicate {
            Some(failure) => Err(failure),
            None => optimize_file(p, options, reference),
        })
        .collect();
    let mut report = BatchReport::default();
    for r in results {
        report.push(r);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MghHeader;
    use crate::intent::{Intent, IntentPolicy};
    use crate::tag::Trailer;
    use crate::volume::{InMemMghVolume, VoxelData};

    fn object(data: VoxelData) -> MghObject {
        let dim = [data.len(), 1, 1, 1];
        let volume = InMemMghVolume::new(dim, data).unwrap();
        MghObject::new(MghHeader::default(), volume, Trailer::default())
    }

    #[test]
    fn fractional_volume_is_left_alone() {
        let mut obj = object(VoxelData::Float(vec![1.5, 2.0, 3.0]));
        let before = obj.clone();
        let d = optimize_object(&mut obj, "x.mgz", &OptimizeOptions::new(), &LabelReference::new()).unwrap();
        assert_eq!(d.narrowing, NarrowingStep::NotIntegral);
        assert_eq!(d.label, LabelStep::NotIntegral);
        assert!(!d.intent.changed());
        assert_eq!(obj, before);
    }

    #[test]
    fn forced_intent_applies_to_fractional_volume() {
        let mut obj = object(VoxelData::Float(vec![0.5]));
        let options = OptimizeOptions::new().intent_policy(IntentPolicy::Imaging);
        let d = optimize_object(&mut obj, "x.mgz", &options, &LabelReference::new()).unwrap();
        assert_eq!(d.label, LabelStep::NotRequested);
        assert_eq!(obj.intent(), Some(Intent::Mri as i64));
        assert_eq!(obj.data_type(), MghType::Float);
    }

    #[test]
    fn narrowing_can_be_disabled() {
        let mut obj = object(VoxelData::Float(vec![0., 1., 2.]));
        let options = OptimizeOptions::new().narrowing(false);
        let d = optimize_object(&mut obj, "x.mgz", &options, &LabelReference::new()).unwrap();
        assert_eq!(d.narrowing, NarrowingStep::Disabled);
        assert_eq!(obj.data_type(), MghType::Float);
        // float storage is never label data by distribution alone
        assert_eq!(d.label.decision().map(|d| d.is_label), Some(false));
    }

    #[test]
    fn classified_after_narrowing() {
        let mut obj = object(VoxelData::Float(vec![0., 2., 4., 41., 0.]));
        let d = optimize_object(&mut obj, "seg.mgz", &OptimizeOptions::new(), &LabelReference::new()).unwrap();
        assert_eq!(obj.data_type(), MghType::Uchar);
        assert_eq!(d.narrowing.narrowing().map(|n| n.target()), Some(MghType::Uchar));
        assert_eq!(obj.intent(), Some(Intent::Label as i64));
    }

    #[test]
    fn failure_display() {
        let f = FileFailure {
            path: "a.mgz".into(),
            kind: FailureKind::WriteFailure,
            error: MghError::InvalidFormat,
        };
        assert_eq!(f.to_string(), "a.mgz: write failure: Invalid MGH file");
        assert!(f.source().is_some());
    }
}
