//! Dataset profiling.
//!
//! Numeric columns follow the usual descriptive-summary layout (count, mean,
//! sample std, min, 25%, 50%, 75%, max; quartiles by linear interpolation).
//! Other columns report count, distinct values and the most frequent ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dagprep_core::types::{scalar_cmp, Column, Dataset, Scalar};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: Scalar,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub count: usize,
    pub unique: usize,
    /// Every value sharing the highest frequency, in value order.
    pub top: Vec<Scalar>,
    pub freq: Option<usize>,
    /// Most frequent values first, capped at the configured length.
    pub frequencies: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub missing: usize,
    pub stats: ColumnStats,
}

impl ColumnProfile {
    /// Named numeric statistics, in display order. These are what `diff`
    /// compares.
    pub fn statistics(&self) -> Vec<(&'static str, Option<f64>)> {
        match &self.stats {
            ColumnStats::Numeric(s) => vec![
                ("count", Some(s.count as f64)),
                ("mean", s.mean),
                ("std", s.std),
                ("min", s.min),
                ("25%", s.q25),
                ("50%", s.q50),
                ("75%", s.q75),
                ("max", s.max),
            ],
            ColumnStats::Categorical(s) => vec![
                ("count", Some(s.count as f64)),
                ("unique", Some(s.unique as f64)),
                ("freq", s.freq.map(|f| f as f64)),
            ],
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.stats, ColumnStats::Numeric(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl Profile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

const DEFAULT_TOP_VALUES: usize = 10;

pub fn profile(data: &Dataset) -> Profile {
    profile_with(data, DEFAULT_TOP_VALUES)
}

/// Profile keeping `top_values` entries in each categorical frequency table.
pub fn profile_with(data: &Dataset, top_values: usize) -> Profile {
    Profile {
        rows: data.num_rows(),
        columns: data
            .columns()
            .iter()
            .map(|c| column_profile(c, top_values))
            .collect(),
    }
}

fn column_profile(column: &Column, top_values: usize) -> ColumnProfile {
    let missing = column.values.iter().filter(|v| v.is_missing()).count();
    let stats = if column.is_numeric() {
        let values: Vec<f64> = column.present().filter_map(Scalar::as_f64).collect();
        ColumnStats::Numeric(numeric_stats(values))
    } else {
        ColumnStats::Categorical(categorical_stats(column, top_values))
    };
    ColumnProfile {
        name: column.name.clone(),
        missing,
        stats,
    }
}

fn numeric_stats(mut values: Vec<f64>) -> NumericStats {
    let count = values.len();
    if count == 0 {
        return NumericStats {
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            q50: None,
            q75: None,
            max: None,
        };
    }
    values.sort_by(f64::total_cmp);

    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (count > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    });

    NumericStats {
        count,
        mean: Some(mean),
        std,
        min: values.first().copied(),
        q25: Some(quantile(&values, 0.25)),
        q50: Some(quantile(&values, 0.50)),
        q75: Some(quantile(&values, 0.75)),
        max: values.last().copied(),
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn categorical_stats(column: &Column, top_values: usize) -> CategoricalStats {
    let mut counts: HashMap<&Scalar, usize> = HashMap::new();
    for v in column.present() {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut table: Vec<(&Scalar, usize)> = counts.into_iter().collect();
    table.sort_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| scalar_cmp(a, b)));

    let freq = table.first().map(|(_, c)| *c);
    let top = table
        .iter()
        .take_while(|(_, c)| Some(*c) == freq)
        .map(|(v, _)| (*v).clone())
        .collect();

    CategoricalStats {
        count: column.present().count(),
        unique: table.len(),
        top,
        freq,
        frequencies: table
            .iter()
            .take(top_values)
            .map(|(v, c)| ValueCount {
                value: (*v).clone(),
                count: *c,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(p: &ColumnProfile) -> &NumericStats {
        match &p.stats {
            ColumnStats::Numeric(s) => s,
            other => panic!("expected numeric, got {:?}", other),
        }
    }

    #[test]
    fn numeric_summary_matches_hand_computation() {
        let d = Dataset::from_rows(
            &["x"],
            vec![
                vec![Scalar::I64(1)],
                vec![Scalar::I64(2)],
                vec![Scalar::F64(3.0)],
                vec![Scalar::I64(4)],
                vec![Scalar::Null],
            ],
        )
        .unwrap();
        let p = profile(&d);
        let col = p.column("x").unwrap();
        assert_eq!(col.missing, 1);
        let s = numeric(col);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert!((s.std.unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.q50, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
    }

    #[test]
    fn zero_rows_give_undefined_statistics() {
        let d = Dataset::from_rows::<&str>(&["x"], vec![]).unwrap();
        let p = profile(&d);
        let s = numeric(p.column("x").unwrap());
        assert_eq!(s.count, 0);
        assert!(s.mean.is_none() && s.std.is_none() && s.max.is_none());
    }

    #[test]
    fn single_value_has_no_std() {
        let d = Dataset::from_rows(&["x"], vec![vec![Scalar::F64(7.0)]]).unwrap();
        let s = profile(&d).columns[0].clone();
        assert_eq!(numeric(&s).std, None);
        assert_eq!(numeric(&s).q75, Some(7.0));
    }

    #[test]
    fn categorical_counts_and_ties() {
        let d = Dataset::from_rows(
            &["c"],
            vec![
                vec![Scalar::from("b")],
                vec![Scalar::from("a")],
                vec![Scalar::from("c")],
                vec![Scalar::from("a")],
                vec![Scalar::from("b")],
                vec![Scalar::Null],
            ],
        )
        .unwrap();
        let p = profile_with(&d, 2);
        match &p.columns[0].stats {
            ColumnStats::Categorical(s) => {
                assert_eq!(s.count, 5);
                assert_eq!(s.unique, 3);
                assert_eq!(s.top, vec![Scalar::from("a"), Scalar::from("b")]);
                assert_eq!(s.freq, Some(2));
                assert_eq!(s.frequencies.len(), 2);
            }
            other => panic!("expected categorical, got {:?}", other),
        }
    }

    #[test]
    fn json_export_round_trips() {
        let d = Dataset::from_rows(
            &["id", "name"],
            vec![vec![Scalar::I64(1), Scalar::from("a")]],
        )
        .unwrap();
        let p = profile(&d);
        let back = Profile::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(back, p);
    }
}
