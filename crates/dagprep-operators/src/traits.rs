//! Transform trait + common interfaces.
//!
//! The engine calls `validate_columns(...)` while previewing a graph (column
//! names only, no data) and `execute(...)` once per step node during a run.

use dagprep_core::cancel::CancelFlag;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::Dataset;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpError {
    /// Column or reference incompatibility; the caller must fix the node.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal fault while building the output.
    #[error("execution error: {0}")]
    Exec(String),

    #[error("cancelled")]
    Cancelled,
}

/// Result of a transformation that ran without fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Produced(Dataset),
    /// The transform legitimately had nothing to emit (e.g. an empty join).
    NoOutput { reason: String },
}

impl Output {
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Output::Produced(d) => Some(d),
            Output::NoOutput { .. } => None,
        }
    }
}

/// Trait that all transformations implement.
///
/// Invariants:
/// - `execute` must be deterministic given the same inputs.
/// - `execute` never mutates its inputs.
/// - For any inputs accepted by `execute`, the output columns equal what
///   `validate_columns` returns for the inputs' column names.
pub trait Transform: Send + Sync + 'static {
    fn kind(&self) -> TransformKind;

    /// Human-readable name (stable).
    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Given the input column lists, return the output column list.
    fn validate_columns(
        &self,
        input_columns: &[Vec<String>],
        reference_columns: &[Vec<String>],
    ) -> Result<Vec<String>, OpError>;

    fn execute(
        &self,
        inputs: &[&Dataset],
        reference_columns: &[Vec<String>],
        cancel: &CancelFlag,
    ) -> Result<Output, OpError>;
}

/// `reference_columns[slot]`, or an empty list when absent.
pub(crate) fn refs_for(reference_columns: &[Vec<String>], slot: usize) -> &[String] {
    reference_columns
        .get(slot)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn require_columns(
    available: &[String],
    wanted: &[String],
    what: &str,
) -> Result<(), OpError> {
    match wanted.iter().find(|w| !available.contains(w)) {
        Some(missing) => Err(OpError::Validation(format!(
            "{} column '{}' is not present in the input",
            what, missing
        ))),
        None => Ok(()),
    }
}
