//! The closed set of transformation kinds a step node can carry.
//!
//! Execution lives in `dagprep-operators`; this enum only carries the
//! static contract (display name, arity) the graph needs at insertion time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Deduplicate,
    Impute,
    Merge,
}

impl TransformKind {
    pub const ALL: [TransformKind; 3] = [
        TransformKind::Deduplicate,
        TransformKind::Impute,
        TransformKind::Merge,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            TransformKind::Deduplicate => "Deduplicate",
            TransformKind::Impute => "Impute Missing Values",
            TransformKind::Merge => "Merge",
        }
    }

    pub fn required_arity(self) -> usize {
        match self {
            TransformKind::Deduplicate | TransformKind::Impute => 1,
            TransformKind::Merge => 2,
        }
    }

    /// Stable lowercase tag used by pipeline files.
    pub fn tag(self) -> &'static str {
        match self {
            TransformKind::Deduplicate => "deduplicate",
            TransformKind::Impute => "impute",
            TransformKind::Merge => "merge",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformKind::ALL
            .into_iter()
            .find(|k| k.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown transformation '{}'", s))
    }
}
