//! Settings of an optimization run.

use crate::intent::{IntentPolicy, IntentTable};
use crate::label::HeuristicParams;
use crate::util::file_name_of;
use std::path::{Component, Path, PathBuf};

/// Where optimized files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Replace each input file.
    InPlace,
    /// Write each file under its own name into this directory.
    Directory(PathBuf),
    /// Write each file into `dir`, at its path relative to `root`. Inputs
    /// outside of `root`, or whose relative path climbs out of it, keep
    /// only their file name.
    Mirror {
        /// Common ancestor of the inputs
        root: PathBuf,
        /// Output directory
        dir: PathBuf,
    },
}

impl Default for OutputPolicy {
    fn default() -> Self {
        OutputPolicy::InPlace
    }
}

impl OutputPolicy {
    /// The output path for the given input.
    pub fn resolve<P: AsRef<Path>>(&self, input: P) -> PathBuf {
        let input = input.as_ref();
        match self {
            OutputPolicy::InPlace => input.to_owned(),
            OutputPolicy::Directory(dir) => dir.join(file_name_of(input)),
            OutputPolicy::Mirror { root, dir } => match input.strip_prefix(root) {
                Ok(rel) if rel.file_name().is_some() && stays_below(rel) => dir.join(rel),
                _ => dir.join(file_name_of(input)),
            },
        }
    }

    /// Whether missing parent directories of the output are created.
    pub fn creates_parents(&self) -> bool {
        matches!(self, OutputPolicy::Mirror { .. })
    }
}

/// Whether joining `rel` to a directory stays inside of it.
fn stays_below(rel: &Path) -> bool {
    rel.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Options and flags which can be used to configure how volumes are
/// optimized.
///
/// # Example
///
/// ```
/// use mgz_optimize::{IntentPolicy, OptimizeOptions};
///
/// let options = OptimizeOptions::new()
///     .tolerance(1e-6)
///     .intent_policy(IntentPolicy::Label)
///     .output_dir("optimized");
/// assert_eq!(options.get_tolerance(), 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOptions {
    tolerance: f64,
    narrowing: bool,
    intent_policy: IntentPolicy,
    classify_non_integral: bool,
    heuristic: HeuristicParams,
    intent_table: IntentTable,
    output: OutputPolicy,
    compression_level: Option<u32>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        OptimizeOptions {
            tolerance: 0.,
            narrowing: true,
            intent_policy: IntentPolicy::default(),
            classify_non_integral: false,
            heuristic: HeuristicParams::default(),
            intent_table: IntentTable::default(),
            output: OutputPolicy::default(),
            compression_level: None,
        }
    }
}

impl OptimizeOptions {
    /// The default options: exact integrality, narrowing on, automatic
    /// intent detection, files replaced in place.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum distance from a sample to its nearest integer for it to
    /// count as an integer.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable storage type narrowing.
    pub fn narrowing(mut self, narrowing: bool) -> Self {
        self.narrowing = narrowing;
        self
    }

    /// How intent codes are decided.
    pub fn intent_policy(mut self, policy: IntentPolicy) -> Self {
        self.intent_policy = policy;
        self
    }

    /// Classify volumes with fractional samples too. They are then always
    /// rejected as label data, unless listed in the reference.
    pub fn classify_non_integral(mut self, classify: bool) -> Self {
        self.classify_non_integral = classify;
        self
    }

    /// Thresholds of the label heuristic.
    pub fn heuristic(mut self, params: HeuristicParams) -> Self {
        self.heuristic = params;
        self
    }

    /// Intent codes to write.
    pub fn intent_table(mut self, table: IntentTable) -> Self {
        self.intent_table = table;
        self
    }

    /// Where to write the results.
    pub fn output(mut self, output: OutputPolicy) -> Self {
        self.output = output;
        self
    }

    /// Shorthand for `output(OutputPolicy::Mirror { root, dir })`.
    pub fn mirror_into<P: Into<PathBuf>, Q: Into<PathBuf>>(self, root: P, dir: Q) -> Self {
        self.output(OutputPolicy::Mirror {
            root: root.into(),
            dir: dir.into(),
        })
    }

    /// Shorthand for `output(OutputPolicy::Directory(dir))`.
    pub fn output_dir<P: Into<PathBuf>>(self, dir: P) -> Self {
        self.output(OutputPolicy::Directory(dir.into()))
    }

    /// Gzip level for compressed outputs, from 0 to 9.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Integrality tolerance
    pub fn get_tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether narrowing is enabled
    pub fn get_narrowing(&self) -> bool {
        self.narrowing
    }

    /// Intent policy
    pub fn get_intent_policy(&self) -> IntentPolicy {
        self.intent_policy
    }

    /// Whether non-integral volumes are classified
    pub fn get_classify_non_integral(&self) -> bool {
        self.classify_non_integral
    }

    /// Label heuristic thresholds
    pub fn get_heuristic(&self) -> &HeuristicParams {
        &self.heuristic
    }

    /// Intent codes
    pub fn get_intent_table(&self) -> &IntentTable {
        &self.intent_table
    }

    /// Output policy
    pub fn get_output(&self) -> &OutputPolicy {
        &self.output
    }

    /// Gzip level, if set
    pub fn get_compression_level(&self) -> Option<u32> {
        self.compression_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths() {
        let input = Path::new("/subjects/bert/mri/aseg.mgz");
        assert_eq!(OutputPolicy::InPlace.resolve(input), input);
        assert_eq!(
            OutputPolicy::Directory("/tmp/out".into()).resolve(input),
            Path::new("/tmp/out/aseg.mgz")
        );
    }

    #[test]
    fn mirrored_paths_keep_their_subdirectories() {
        let policy = OutputPolicy::Mirror {
            root: "/subjects".into(),
            dir: "/tmp/out".into(),
        };
        assert_eq!(
            policy.resolve("/subjects/bert/mri/aseg.mgz"),
            Path::new("/tmp/out/bert/mri/aseg.mgz")
        );
        assert_eq!(
            policy.resolve("/elsewhere/T1.mgz"),
            Path::new("/tmp/out/T1.mgz")
        );
        assert_eq!(
            policy.resolve("/subjects/../etc/x.mgz"),
            Path::new("/tmp/out/x.mgz")
        );
        let unrooted = OutputPolicy::Mirror {
            root: "".into(),
            dir: "/tmp/out".into(),
        };
        assert_eq!(unrooted.resolve("/abs/T1.mgz"), Path::new("/tmp/out/T1.mgz"));
        assert_eq!(unrooted.resolve("rel/T1.mgz"), Path::new("/tmp/out/rel/T1.mgz"));
        assert!(policy.creates_parents());
        assert!(!OutputPolicy::Directory("/tmp/out".into()).creates_parents());
    }

    #[test]
    fn builder() {
        let o = OptimizeOptions::new()
            .narrowing(false)
            .intent_policy(IntentPolicy::Ignore)
            .compression_level(9);
        assert!(!o.get_narrowing());
        assert_eq!(o.get_intent_policy(), IntentPolicy::Ignore);
        assert_eq!(o.get_compression_level(), Some(9));
        assert_eq!(o.get_tolerance(), 0.);
        assert_eq!(o.get_output(), &OutputPolicy::InPlace);
    }
}
