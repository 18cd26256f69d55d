//! Kind → transform dispatch.

use dagprep_core::cancel::CancelFlag;
use dagprep_core::config::EngineConfig;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::Dataset;

use crate::dedup::Deduplicate;
use crate::impute::Impute;
use crate::merge::Merge;
use crate::traits::{OpError, Output, Transform};

/// Holds one configured instance of every built-in transform.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    deduplicate: Deduplicate,
    impute: Impute,
    merge: Merge,
}

impl Registry {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            impute: Impute {
                neighbors: cfg.impute_neighbors,
            },
            ..Self::default()
        }
    }

    pub fn get(&self, kind: TransformKind) -> &dyn Transform {
        match kind {
            TransformKind::Deduplicate => &self.deduplicate,
            TransformKind::Impute => &self.impute,
            TransformKind::Merge => &self.merge,
        }
    }

    /// Preview the output columns of `kind` without touching data.
    pub fn validate_columns(
        &self,
        kind: TransformKind,
        input_columns: &[Vec<String>],
        reference_columns: &[Vec<String>],
    ) -> Result<Vec<String>, OpError> {
        if input_columns.len() != kind.required_arity() {
            return Err(OpError::Validation(format!(
                "{} expects {} input(s), got {}",
                kind,
                kind.required_arity(),
                input_columns.len()
            )));
        }
        self.get(kind)
            .validate_columns(input_columns, reference_columns)
    }

    /// Run `kind`. Fewer inputs than the arity is a legitimate no-output
    /// outcome; more is a caller fault.
    pub fn execute(
        &self,
        kind: TransformKind,
        inputs: &[&Dataset],
        reference_columns: &[Vec<String>],
        cancel: &CancelFlag,
    ) -> Result<Output, OpError> {
        let arity = kind.required_arity();
        if inputs.len() > arity {
            return Err(OpError::Exec(format!(
                "{} expects {} input(s), got {}",
                kind,
                arity,
                inputs.len()
            )));
        }
        if inputs.len() < arity {
            return Ok(Output::NoOutput {
                reason: format!("{} is missing {} input(s)", kind, arity - inputs.len()),
            });
        }
        self.get(kind).execute(inputs, reference_columns, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagprep_core::types::Scalar;

    #[test]
    fn every_kind_dispatches_to_itself() {
        let reg = Registry::default();
        for kind in TransformKind::ALL {
            assert_eq!(reg.get(kind).kind(), kind);
            assert_eq!(reg.get(kind).name(), kind.display_name());
        }
    }

    #[test]
    fn config_reaches_impute() {
        let cfg = EngineConfig {
            impute_neighbors: 2,
            ..Default::default()
        };
        let reg = Registry::new(&cfg);
        assert_eq!(reg.impute.neighbors, 2);
    }

    #[test]
    fn arity_checked_before_dispatch() {
        let reg = Registry::default();
        let err = reg
            .validate_columns(TransformKind::Merge, &[vec!["id".into()]], &[])
            .unwrap_err();
        assert!(matches!(err, OpError::Validation(_)));

        let d = Dataset::from_rows(&["id"], vec![vec![Scalar::I64(1)]]).unwrap();
        let out = reg
            .execute(TransformKind::Merge, &[&d], &[], &CancelFlag::new())
            .unwrap();
        assert!(matches!(out, Output::NoOutput { .. }));
        assert!(reg
            .execute(TransformKind::Deduplicate, &[&d, &d], &[], &CancelFlag::new())
            .is_err());
    }
}
