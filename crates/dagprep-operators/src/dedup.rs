//! Exact duplicate-row removal.

use std::collections::HashSet;

use dagprep_core::cancel::CancelFlag;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::{Column, Dataset, Scalar};

use crate::traits::{OpError, Output, Transform};

/// Keeps the first occurrence of every distinct row, preserving order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Deduplicate;

impl Transform for Deduplicate {
    fn kind(&self) -> TransformKind {
        TransformKind::Deduplicate
    }

    fn validate_columns(
        &self,
        input_columns: &[Vec<String>],
        _reference_columns: &[Vec<String>],
    ) -> Result<Vec<String>, OpError> {
        input_columns
            .first()
            .cloned()
            .ok_or_else(|| OpError::Validation("deduplicate needs one input".into()))
    }

    fn execute(
        &self,
        inputs: &[&Dataset],
        _reference_columns: &[Vec<String>],
        _cancel: &CancelFlag,
    ) -> Result<Output, OpError> {
        let Some(data) = inputs.first() else {
            return Ok(Output::NoOutput {
                reason: "deduplicate input is absent".into(),
            });
        };
        Ok(Output::Produced(deduplicate(data)?))
    }
}

/// Rows compare by value: integral floats match integers and every missing
/// cell matches every other missing cell. Kept rows retain their cells.
pub fn deduplicate(data: &Dataset) -> Result<Dataset, OpError> {
    let mut seen: HashSet<Vec<Scalar>> = HashSet::with_capacity(data.num_rows());
    let keep: Vec<usize> = (0..data.num_rows())
        .filter(|&i| seen.insert(row_key(data, i)))
        .collect();

    let columns = data
        .columns()
        .iter()
        .map(|c| {
            Column::new(
                c.name.clone(),
                keep.iter().map(|&i| c.values[i].clone()).collect(),
            )
        })
        .collect();
    Dataset::new(columns).map_err(|e| OpError::Exec(e.to_string()))
}

fn row_key(data: &Dataset, row: usize) -> Vec<Scalar> {
    data.columns()
        .iter()
        .map(|c| {
            let v = &c.values[row];
            if v.is_missing() {
                Scalar::Null
            } else {
                v.normalized()
            }
        })
        .collect()
}
