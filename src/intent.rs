//! Intent codes and the tagging of volumes with them.
//!
//! The intent code is a single integer stored in the trailer of an MGH
//! file, telling viewers how to interpret the samples. Only two values
//! are currently defined, see [`Intent`](./enum.Intent.html).

use num_traits::FromPrimitive;
use std::fmt;

/// Known intent values.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive)]
pub enum Intent {
    /// Continuous imaging data
    Mri = 0,
    /// Discrete label (segmentation) data
    Label = 1,
}

impl Intent {
    /// The code stored for this intent.
    pub fn code(self) -> IntentCode {
        IntentCode(self as i64)
    }
}

/// A raw intent code, as stored in the file.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct IntentCode(pub i64);

impl IntentCode {
    /// The known intent this code stands for, if any.
    pub fn intent(self) -> Option<Intent> {
        Intent::from_i64(self.0)
    }
}

impl From<Intent> for IntentCode {
    fn from(intent: Intent) -> Self {
        intent.code()
    }
}

impl fmt::Display for IntentCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.intent() {
            Some(Intent::Mri) => write!(f, "mri ({})", self.0),
            Some(Intent::Label) => write!(f, "label ({})", self.0),
            None => write!(f, "unknown ({})", self.0),
        }
    }
}

/// Render an optional intent code, with "none" for a missing record.
pub fn describe(code: Option<IntentCode>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// The codes written for each classification outcome.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IntentTable {
    /// Code for imaging data
    pub imaging: IntentCode,
    /// Code for label data
    pub label: IntentCode,
}

impl Default for IntentTable {
    fn default() -> Self {
        IntentTable {
            imaging: Intent::Mri.code(),
            label: Intent::Label.code(),
        }
    }
}

/// How the intent of a volume should be decided.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IntentPolicy {
    /// Tag label volumes as such, and leave the others alone.
    AutoDetect,
    /// Tag every volume as imaging data.
    Imaging,
    /// Tag every volume as label data.
    Label,
    /// Never touch the intent record.
    Ignore,
}

impl Default for IntentPolicy {
    fn default() -> Self {
        IntentPolicy::AutoDetect
    }
}

impl IntentPolicy {
    /// Whether this policy needs a label classification to decide.
    pub fn needs_classification(self) -> bool {
        self == IntentPolicy::AutoDetect
    }
}

/// The intent of a volume before and after tagging.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IntentChange {
    /// Code recorded in the input
    pub before: Option<IntentCode>,
    /// Code to record in the output
    pub after: Option<IntentCode>,
}

impl IntentChange {
    /// Whether the intent record has to be rewritten.
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// An unclassified volume's intent, waiting for a decision.
///
/// Every decision consumes the tagger, so a volume is tagged at most once.
#[derive(Debug)]
pub struct IntentTagger {
    current: Option<IntentCode>,
}

impl IntentTagger {
    /// Start tagging a volume with the given recorded intent.
    pub fn new(current: Option<IntentCode>) -> Self {
        IntentTagger { current }
    }

    /// Apply a label decision. Label data gets the label code; anything
    /// else keeps its current intent.
    pub fn classify(self, is_label: bool, table: &IntentTable) -> IntentChange {
        if is_label {
            self.force(table.label)
        } else {
            self.keep()
        }
    }

    /// Record the given code unconditionally.
    pub fn force(self, code: IntentCode) -> IntentChange {
        IntentChange {
            before: self.current,
            after: Some(code),
        }
    }

    /// Leave the intent as it is.
    pub fn keep(self) -> IntentChange {
        IntentChange {
            before: self.current,
            after: self.current,
        }
    }

    /// Decide according to a policy. `is_label` is the outcome of label
    /// classification, or `None` if the volume was not classified.
    pub fn resolve(
        self,
        policy: IntentPolicy,
        is_label: Option<bool>,
        table: &IntentTable,
    ) -> IntentChange {
        match (policy, is_label) {
            (IntentPolicy::AutoDetect, Some(l)) => self.classify(l, table),
            (IntentPolicy::AutoDetect, None) | (IntentPolicy::Ignore, _) => self.keep(),
            (IntentPolicy::Imaging, _) => self.force(table.imaging),
            (IntentPolicy::Label, _) => self.force(table.label),
        }
    }
}
