//! Missing-value imputation.
//!
//! Numeric reference columns are filled by K-nearest-neighbour averaging.
//! Distances use every numeric column of the input and skip coordinates
//! missing on either side, scaled up by `total / present` so rows with
//! fewer shared coordinates are not favoured. Non-numeric reference
//! columns get their most frequent value.

use std::collections::HashMap;

use dagprep_core::cancel::CancelFlag;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::{scalar_cmp, Column, Dataset, Scalar};

use crate::traits::{refs_for, require_columns, OpError, Output, Transform};

#[derive(Debug, Clone, Copy)]
pub struct Impute {
    pub neighbors: usize,
}

impl Default for Impute {
    fn default() -> Self {
        Self { neighbors: 5 }
    }
}

impl Transform for Impute {
    fn kind(&self) -> TransformKind {
        TransformKind::Impute
    }

    fn validate_columns(
        &self,
        input_columns: &[Vec<String>],
        reference_columns: &[Vec<String>],
    ) -> Result<Vec<String>, OpError> {
        let columns = input_columns
            .first()
            .ok_or_else(|| OpError::Validation("impute needs one input".into()))?;
        let targets = refs_for(reference_columns, 0);
        if targets.is_empty() {
            return Err(OpError::Validation(
                "impute needs at least one column to fill".into(),
            ));
        }
        require_columns(columns, targets, "impute")?;
        Ok(columns.clone())
    }

    fn execute(
        &self,
        inputs: &[&Dataset],
        reference_columns: &[Vec<String>],
        cancel: &CancelFlag,
    ) -> Result<Output, OpError> {
        let Some(data) = inputs.first() else {
            return Ok(Output::NoOutput {
                reason: "impute input is absent".into(),
            });
        };
        self.validate_columns(&[data.column_names()], reference_columns)?;

        let matrix = NumericMatrix::new(data);
        let mut columns: Vec<Column> = data.columns().to_vec();
        let mut done: Vec<&str> = Vec::new();

        for target in refs_for(reference_columns, 0) {
            if done.contains(&target.as_str()) {
                continue;
            }
            done.push(target);
            let Some(idx) = data.column_index(target) else {
                continue;
            };
            columns[idx].values = match matrix.slot(idx) {
                Some(j) => matrix.knn_fill(&data.columns()[idx], j, self.neighbors.max(1), cancel)?,
                None => most_frequent_fill(&data.columns()[idx]),
            };
        }

        Dataset::new(columns)
            .map(Output::Produced)
            .map_err(|e| OpError::Exec(e.to_string()))
    }
}

/// Row-major view of the numeric columns, missing cells as `None`.
struct NumericMatrix {
    /// Dataset column index of each matrix column.
    sources: Vec<usize>,
    rows: Vec<Vec<Option<f64>>>,
}

impl NumericMatrix {
    fn new(data: &Dataset) -> Self {
        let sources: Vec<usize> = data
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_numeric())
            .map(|(i, _)| i)
            .collect();
        let rows = (0..data.num_rows())
            .map(|r| {
                sources
                    .iter()
                    .map(|&c| data.columns()[c].values[r].as_f64())
                    .collect()
            })
            .collect();
        Self { sources, rows }
    }

    fn slot(&self, column: usize) -> Option<usize> {
        self.sources.iter().position(|&c| c == column)
    }

    fn distance(&self, a: usize, b: usize) -> Option<f64> {
        let total = self.sources.len();
        let mut present = 0usize;
        let mut sum = 0.0;
        for (x, y) in self.rows[a].iter().zip(&self.rows[b]) {
            if let (Some(x), Some(y)) = (x, y) {
                present += 1;
                sum += (x - y) * (x - y);
            }
        }
        (present > 0).then(|| (sum * total as f64 / present as f64).sqrt())
    }

    fn knn_fill(
        &self,
        column: &Column,
        j: usize,
        k: usize,
        cancel: &CancelFlag,
    ) -> Result<Vec<Scalar>, OpError> {
        let donors: Vec<usize> = (0..self.rows.len())
            .filter(|&r| self.rows[r][j].is_some())
            .collect();
        let observed: Vec<f64> = donors.iter().filter_map(|&d| self.rows[d][j]).collect();
        let column_mean = mean(&observed);

        let mut out = Vec::with_capacity(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            if row[j].is_some() {
                out.push(column.values[r].clone());
                continue;
            }
            if cancel.is_cancelled() {
                return Err(OpError::Cancelled);
            }
            let mut nearest: Vec<(f64, usize)> = donors
                .iter()
                .filter_map(|&d| self.distance(r, d).map(|dist| (dist, d)))
                .collect();
            nearest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let picked: Vec<f64> = nearest
                .iter()
                .take(k)
                .filter_map(|&(_, d)| self.rows[d][j])
                .collect();
            let value = mean(&picked).or(column_mean);
            out.push(value.map(Scalar::F64).unwrap_or(Scalar::Null));
        }
        Ok(out)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Fill missing cells with the mode; ties go to the smallest value.
fn most_frequent_fill(column: &Column) -> Vec<Scalar> {
    let mut counts: HashMap<&Scalar, usize> = HashMap::new();
    for v in column.present() {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mode = counts
        .into_iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| scalar_cmp(b, a)))
        .map(|(v, _)| v.clone());

    match mode {
        Some(mode) => column
            .values
            .iter()
            .map(|v| if v.is_missing() { mode.clone() } else { v.clone() })
            .collect(),
        None => column.values.clone(),
    }
}
