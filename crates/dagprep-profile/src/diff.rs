//! Column-wise, statistic-wise differences between two profiles.

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::profile::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub statistic: String,
    pub a: Option<f64>,
    pub b: Option<f64>,
    /// `b - a`; undefined when either side is.
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub column: String,
    pub deltas: Vec<StatDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDiff {
    pub columns: Vec<ColumnDiff>,
}

impl ProfileDiff {
    pub fn delta(&self, column: &str, statistic: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.column == column)?
            .deltas
            .iter()
            .find(|d| d.statistic == statistic)?
            .delta
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `b - a` over shared columns (in `a`'s order) and shared statistics.
pub fn diff(a: &Profile, b: &Profile) -> Result<ProfileDiff> {
    let mut columns = Vec::new();
    for ca in &a.columns {
        let Some(cb) = b.column(&ca.name) else {
            continue;
        };
        let stats_b = cb.statistics();
        let deltas = ca
            .statistics()
            .into_iter()
            .filter_map(|(name, va)| {
                let (_, vb) = stats_b.iter().find(|(n, _)| *n == name)?;
                Some(StatDelta {
                    statistic: name.to_string(),
                    a: va,
                    b: *vb,
                    delta: va.zip(*vb).map(|(x, y)| y - x),
                })
            })
            .collect();
        columns.push(ColumnDiff {
            column: ca.name.clone(),
            deltas,
        });
    }

    if columns.is_empty() {
        return Err(ProfileError::Incomparable);
    }
    Ok(ProfileDiff { columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile;
    use dagprep_core::types::{Dataset, Scalar};

    fn ints(name: &str, values: &[i64]) -> Dataset {
        Dataset::from_rows(
            &[name],
            values.iter().map(|&v| vec![Scalar::I64(v)]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn deltas_are_b_minus_a() {
        let a = profile(&ints("x", &[1, 2, 3]));
        let b = profile(&ints("x", &[2, 4, 6, 8]));
        let d = diff(&a, &b).unwrap();
        assert_eq!(d.delta("x", "count"), Some(1.0));
        assert_eq!(d.delta("x", "mean"), Some(3.0));
        assert_eq!(d.delta("x", "max"), Some(5.0));
    }

    #[test]
    fn no_shared_columns_is_incomparable() {
        let a = profile(&ints("x", &[1]));
        let b = profile(&ints("y", &[1]));
        assert!(matches!(diff(&a, &b), Err(ProfileError::Incomparable)));
    }

    #[test]
    fn undefined_side_gives_undefined_delta() {
        let a = profile(&ints("x", &[]));
        let b = profile(&ints("x", &[5]));
        let d = diff(&a, &b).unwrap();
        assert_eq!(d.delta("x", "count"), Some(1.0));
        assert_eq!(d.delta("x", "mean"), None);
    }

    #[test]
    fn mixed_kinds_share_only_common_statistics() {
        let a = profile(&ints("x", &[1, 2]));
        let b = profile(
            &Dataset::from_rows(&["x"], vec![vec![Scalar::from("k")]]).unwrap(),
        );
        let d = diff(&a, &b).unwrap();
        let names: Vec<_> = d.columns[0]
            .deltas
            .iter()
            .map(|s| s.statistic.as_str())
            .collect();
        assert_eq!(names, vec!["count"]);
    }
}
