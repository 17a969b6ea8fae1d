//! Classification of volumes as label (segmentation) data.
//!
//! A volume is label data if its name is listed in a [`LabelReference`],
//! or, failing that, if its samples are integers drawn from a small and
//! sparse set of values. Every decision carries its [`LabelBasis`] so that
//! callers can audit why a volume was (or was not) tagged.
//!
//! [`LabelReference`]: ./struct.LabelReference.html
//! [`LabelBasis`]: ./enum.LabelBasis.html

use crate::error::{MghError, Result};
use crate::typedef::MghType;
use crate::util::file_name_of;
use crate::volume::VoxelData;
use glob::Pattern;
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// File names of the label volumes produced by the FreeSurfer pipeline.
pub const FREESURFER_LABEL_FILES: &[&str] = &[
    "aparc+aseg.mgz",
    "aparc.DKTatlas+aseg.mgz",
    "aparc.a2005s+aseg.mgz",
    "aparc.a2009s+aseg.mgz",
    "apas+head.mgz",
    "aseg.auto.mgz",
    "aseg.auto_noCCseg.mgz",
    "aseg.mgz",
    "aseg.presurf.hypos.mgz",
    "aseg.presurf.mgz",
    "ctrl_pts.mgz",
    "filled.auto.mgz",
    "filled.mgz",
    "gtmseg.mgz",
    "lh.ribbon.mgz",
    "rh.ribbon.mgz",
    "ribbon.mgz",
    "subcort.mask.1mm.mgz",
    "subcort.mask.mgz",
    "surface.defects.mgz",
    "wm.asegedit.mgz",
    "wmparc.mgz",
];

/// A read-only set of volume names known to contain label data.
///
/// Entries are matched against the final component of a path. An entry
/// containing any of `*?[` is a glob pattern; any other entry must match
/// the file name exactly.
#[derive(Debug, Default, Clone)]
pub struct LabelReference {
    names: BTreeSet<String>,
    patterns: Vec<Pattern>,
}

impl LabelReference {
    /// An empty reference, which matches nothing.
    pub fn new() -> Self {
        LabelReference::default()
    }

    /// The reference list of FreeSurfer label volumes.
    pub fn freesurfer() -> Self {
        LabelReference {
            names: FREESURFER_LABEL_FILES.iter().map(|s| s.to_string()).collect(),
            patterns: Vec::new(),
        }
    }

    /// Build a reference out of names and patterns.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reference = LabelReference::new();
        for e in entries {
            reference.insert(e.as_ref())?;
        }
        Ok(reference)
    }

    /// Read a reference list with one entry per line. Blank lines and
    /// lines starting with `#` are ignored, and surrounding whitespace
    /// is trimmed.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut reference = LabelReference::new();
        for line in reader.lines() {
            let line = line?;
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            reference.insert(entry)?;
        }
        Ok(reference)
    }

    /// Read a reference list from a file. See [`from_reader`](#method.from_reader).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    fn insert(&mut self, entry: &str) -> Result<()> {
        if entry.contains(|c: char| c == '*' || c == '?' || c == '[') {
            let pattern = Pattern::new(entry)
                .map_err(|e| MghError::InvalidPattern(entry.to_string(), e))?;
            self.patterns.push(pattern);
        } else {
            let _ = self.names.insert(entry.to_string());
        }
        Ok(())
    }

    /// Find the entry matching the file name of `identifier`, if any.
    /// Exact names take precedence over patterns.
    pub fn find<P: AsRef<Path>>(&self, identifier: P) -> Option<String> {
        let name = file_name_of(identifier);
        if name.is_empty() {
            return None;
        }
        if self.names.contains(&name) {
            return Some(name);
        }
        self.patterns
            .iter()
            .find(|p| p.matches(&name))
            .map(|p| p.as_str().to_string())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.names.len() + self.patterns.len()
    }

    /// Whether the reference has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thresholds of the value-distribution heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicParams {
    /// Label data must have a ratio of distinct values to value span
    /// strictly below this.
    pub max_distinct_ratio: f64,
    /// Label data must have strictly fewer distinct values than this.
    pub max_distinct_values: usize,
    /// Relative distance to a threshold under which a measure is
    /// considered borderline.
    pub ambiguity_margin: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        HeuristicParams {
            max_distinct_ratio: 0.5,
            max_distinct_values: 32,
            ambiguity_margin: 0.1,
        }
    }
}

/// Compact summary of the values of an integer volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSummary {
    /// Number of distinct values found
    pub distinct: usize,
    /// Whether counting stopped early, making `distinct` a lower bound
    pub capped: bool,
    /// Smallest value
    pub min: i64,
    /// Largest value
    pub max: i64,
}

impl ValueSummary {
    /// Summarize integer samples, counting distinct values up to `cap`.
    /// Returns `None` for floating point samples.
    pub fn of(data: &VoxelData, cap: usize) -> Option<ValueSummary> {
        match data {
            VoxelData::Uchar(v) => Some(dense_summary(v, |x| x as usize, 1 << 8, 0)),
            VoxelData::Short(v) => Some(dense_summary(
                v,
                |x| (i32::from(x) - i32::from(i16::MIN)) as usize,
                1 << 16,
                i64::from(i16::MIN),
            )),
            VoxelData::Int(v) => Some(sparse_summary(v, cap)),
            VoxelData::Float(_) => None,
        }
    }

    /// Number of integers in `[min, max]`.
    pub fn span(&self) -> u64 {
        (i128::from(self.max) - i128::from(self.min) + 1) as u64
    }
}

/// Count values of a narrow type with a presence table.
fn dense_summary<T, F>(data: &[T], slot: F, slots: usize, offset: i64) -> ValueSummary
where
    T: Copy,
    F: Fn(T) -> usize,
{
    let mut seen = vec![false; slots];
    for &x in data {
        seen[slot(x)] = true;
    }
    let mut present = seen.iter().enumerate().filter(|(_, s)| **s).map(|(i, _)| i);
    let first = present.next();
    let (distinct, last) = present.fold((first.map_or(0, |_| 1), first), |(n, _), i| {
        (n + 1, Some(i))
    });
    let min = first.map_or(0, |i| i as i64 + offset);
    let max = last.map_or(0, |i| i as i64 + offset);
    ValueSummary {
        distinct,
        capped: false,
        min,
        max,
    }
}

/// Count values of a wide type with a hash set, stopping at `cap`
/// distinct values. The bounds always cover every sample.
fn sparse_summary(data: &[i32], cap: usize) -> ValueSummary {
    let mut seen = HashSet::new();
    let mut capped = false;
    let mut min = i32::MAX;
    let mut max = i32::MIN;
    for &x in data {
        min = min.min(x);
        max = max.max(x);
        if !capped && seen.insert(x) && seen.len() >= cap {
            capped = true;
        }
    }
    if data.is_empty() {
        min = 0;
        max = 0;
    }
    ValueSummary {
        distinct: seen.len(),
        capped,
        min: min.into(),
        max: max.into(),
    }
}

/// The measurements behind a heuristic decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicEvidence {
    /// The value summary the heuristic was applied to
    pub summary: ValueSummary,
    /// Distinct values divided by value span
    pub ratio: f64,
    /// Whether the volume was accepted as label data
    pub accepted: bool,
    /// Whether a borderline measure could have flipped the outcome
    pub ambiguous: bool,
}

/// Why a volume was or was not classified as label data.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelBasis {
    /// The volume's name matched this reference entry
    Reference(String),
    /// The samples are not stored as integers
    NotInteger(MghType),
    /// The value-distribution heuristic decided
    Heuristic(HeuristicEvidence),
}

/// A label classification, along with its basis.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDecision {
    /// Whether the volume holds label data
    pub is_label: bool,
    /// Why
    pub basis: LabelBasis,
}

impl LabelDecision {
    /// Whether the decision came from a borderline heuristic result.
    pub fn is_ambiguous(&self) -> bool {
        match &self.basis {
            LabelBasis::Heuristic(e) => e.ambiguous,
            _ => false,
        }
    }
}

/// Decides whether volumes hold label data.
#[derive(Debug, Clone, Copy)]
pub struct LabelClassifier<'a> {
    reference: &'a LabelReference,
    params: HeuristicParams,
}

impl<'a> LabelClassifier<'a> {
    /// Create a classifier over the given reference and thresholds.
    pub fn new(reference: &'a LabelReference, params: HeuristicParams) -> Self {
        LabelClassifier { reference, params }
    }

    /// Classify the samples of the volume named `identifier`. In order:
    /// a reference match wins, non-integer storage is rejected, and the
    /// distribution heuristic decides the rest.
    pub fn classify<P: AsRef<Path>>(&self, identifier: P, data: &VoxelData) -> LabelDecision {
        if let Some(entry) = self.reference.find(identifier) {
            return LabelDecision {
                is_label: true,
                basis: LabelBasis::Reference(entry),
            };
        }
        let cap = self.params.max_distinct_values.saturating_mul(2).max(256);
        match ValueSummary::of(data, cap) {
            None => LabelDecision {
                is_label: false,
                basis: LabelBasis::NotInteger(data.data_type()),
            },
            Some(summary) => {
                let evidence = self.weigh(summary);
                LabelDecision {
                    is_label: evidence.accepted,
                    basis: LabelBasis::Heuristic(evidence),
                }
            }
        }
    }

    /// Apply the distribution heuristic to a value summary. A volume
    /// without samples is never label data.
    pub fn weigh(&self, summary: ValueSummary) -> HeuristicEvidence {
        let p = &self.params;
        let ratio = summary.distinct as f64 / summary.span() as f64;
        let count = summary.distinct as f64;
        let ceiling = p.max_distinct_values as f64;

        let ratio_ok = ratio < p.max_distinct_ratio;
        let count_ok = summary.distinct < p.max_distinct_values;
        let ratio_near = (ratio - p.max_distinct_ratio).abs() <= p.ambiguity_margin * p.max_distinct_ratio;
        let count_near = !summary.capped && (count - ceiling).abs() <= p.ambiguity_margin * ceiling;

        let accepted = summary.distinct > 0 && ratio_ok && count_ok;
        let ambiguous = if summary.distinct == 0 {
            false
        } else if accepted {
            ratio_near || count_near
        } else {
            (ratio_ok || ratio_near) && (count_ok || count_near)
        };
        HeuristicEvidence {
            summary,
            ratio,
            accepted,
            ambiguous,
        }
    }
}
