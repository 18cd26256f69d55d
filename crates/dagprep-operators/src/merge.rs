//! Inner hash join of two datasets on paired key columns.
//!
//! Output layout: every left column, then the right columns minus any right
//! key whose paired left key has the same name. Remaining name clashes get
//! a `_right` suffix. Rows with a missing key never match.

use std::collections::HashMap;

use dagprep_core::cancel::CancelFlag;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::{Dataset, Scalar};

use crate::traits::{refs_for, require_columns, OpError, Output, Transform};

#[derive(Debug, Default, Clone, Copy)]
pub struct Merge;

/// Column plan shared by validation and execution.
struct Layout {
    names: Vec<String>,
    /// Right-side column indices copied into the output, in order.
    right_kept: Vec<usize>,
}

fn layout(left: &[String], right: &[String], lk: &[String], rk: &[String]) -> Layout {
    let mut names = left.to_vec();
    let mut right_kept = Vec::new();
    for (i, name) in right.iter().enumerate() {
        let shared_key = rk
            .iter()
            .zip(lk)
            .any(|(r, l)| r == name && l == name);
        if shared_key {
            continue;
        }
        let mut out = name.clone();
        while names.contains(&out) {
            out.push_str("_right");
        }
        names.push(out);
        right_kept.push(i);
    }
    Layout { names, right_kept }
}

impl Merge {
    fn check_keys<'a>(
        &self,
        input_columns: &[Vec<String>],
        reference_columns: &'a [Vec<String>],
    ) -> Result<(&'a [String], &'a [String]), OpError> {
        if input_columns.len() != 2 {
            return Err(OpError::Validation("merge needs two inputs".into()));
        }
        let lk = refs_for(reference_columns, 0);
        let rk = refs_for(reference_columns, 1);
        if lk.is_empty() || rk.is_empty() {
            return Err(OpError::Validation(
                "merge needs a non-empty key list for each input".into(),
            ));
        }
        if lk.len() != rk.len() {
            return Err(OpError::Validation(format!(
                "merge key lists differ in length ({} vs {})",
                lk.len(),
                rk.len()
            )));
        }
        require_columns(&input_columns[0], lk, "left key")?;
        require_columns(&input_columns[1], rk, "right key")?;
        Ok((lk, rk))
    }
}

impl Transform for Merge {
    fn kind(&self) -> TransformKind {
        TransformKind::Merge
    }

    fn validate_columns(
        &self,
        input_columns: &[Vec<String>],
        reference_columns: &[Vec<String>],
    ) -> Result<Vec<String>, OpError> {
        let (lk, rk) = self.check_keys(input_columns, reference_columns)?;
        Ok(layout(&input_columns[0], &input_columns[1], lk, rk).names)
    }

    fn execute(
        &self,
        inputs: &[&Dataset],
        reference_columns: &[Vec<String>],
        _cancel: &CancelFlag,
    ) -> Result<Output, OpError> {
        let &[left, right] = inputs else {
            return Ok(Output::NoOutput {
                reason: format!("merge needs two inputs, {} available", inputs.len()),
            });
        };
        let input_columns = [left.column_names(), right.column_names()];
        let (lk, rk) = self.check_keys(&input_columns, reference_columns)?;
        let plan = layout(&input_columns[0], &input_columns[1], lk, rk);

        let key_of = |data: &Dataset, keys: &[String], row: usize| -> Option<Vec<Scalar>> {
            keys.iter()
                .map(|k| {
                    let v = &data.column(k)?.values[row];
                    (!v.is_missing()).then(|| v.normalized())
                })
                .collect()
        };

        let mut index: HashMap<Vec<Scalar>, Vec<usize>> = HashMap::new();
        for r in 0..right.num_rows() {
            if let Some(key) = key_of(right, rk, r) {
                index.entry(key).or_default().push(r);
            }
        }

        let mut rows = Vec::new();
        for l in 0..left.num_rows() {
            let Some(matches) = key_of(left, lk, l).and_then(|k| index.get(&k)) else {
                continue;
            };
            let base = left.row(l);
            for &r in matches {
                let mut row = base.clone();
                row.extend(
                    plan.right_kept
                        .iter()
                        .map(|&c| right.columns()[c].values[r].clone()),
                );
                rows.push(row);
            }
        }

        if rows.is_empty() {
            return Ok(Output::NoOutput {
                reason: "merge produced no rows".into(),
            });
        }
        Dataset::from_rows(&plan.names, rows)
            .map(Output::Produced)
            .map_err(|e| OpError::Exec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn people() -> Dataset {
        Dataset::from_rows(
            &["id", "name"],
            vec![
                vec![Scalar::I64(1), Scalar::from("a")],
                vec![Scalar::I64(2), Scalar::from("b")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn shared_key_name_appears_once() {
        let cols = vec![names(&["id", "name"]), names(&["id", "score"])];
        let out = Merge
            .validate_columns(&cols, &[names(&["id"]), names(&["id"])])
            .unwrap();
        assert_eq!(out, names(&["id", "name", "score"]));
    }

    #[test]
    fn distinct_key_names_and_clashes() {
        let cols = vec![names(&["id", "v"]), names(&["pid", "v"])];
        let out = Merge
            .validate_columns(&cols, &[names(&["id"]), names(&["pid"])])
            .unwrap();
        assert_eq!(out, names(&["id", "v", "pid", "v_right"]));
    }

    #[test]
    fn unequal_or_empty_keys_fail_validation() {
        let cols = vec![names(&["id", "name"]), names(&["id", "name"])];
        for refs in [
            vec![names(&["id"]), names(&["id", "name"])],
            vec![names(&[]), names(&["id"])],
            vec![names(&["id"])],
            vec![names(&["id"]), names(&["missing"])],
        ] {
            assert!(matches!(
                Merge.validate_columns(&cols, &refs),
                Err(OpError::Validation(_))
            ));
        }
    }

    #[test]
    fn integral_floats_match_integers() {
        let right = Dataset::from_rows(
            &["id", "score"],
            vec![vec![Scalar::F64(2.0), Scalar::I64(5)]],
        )
        .unwrap();
        let out = Merge
            .execute(
                &[&people(), &right],
                &[names(&["id"]), names(&["id"])],
                &CancelFlag::new(),
            )
            .unwrap();
        let d = out.dataset().unwrap();
        assert_eq!(
            d.row(0),
            vec![Scalar::I64(2), Scalar::from("b"), Scalar::I64(5)]
        );
    }

    #[test]
    fn empty_join_is_no_output() {
        let right = Dataset::from_rows(&["id"], vec![vec![Scalar::I64(9)]]).unwrap();
        let out = Merge
            .execute(
                &[&people(), &right],
                &[names(&["id"]), names(&["id"])],
                &CancelFlag::new(),
            )
            .unwrap();
        assert!(matches!(out, Output::NoOutput { .. }));
    }

    #[test]
    fn absent_input_is_no_output() {
        let out = Merge
            .execute(&[&people()], &[names(&["id"]), names(&["id"])], &CancelFlag::new())
            .unwrap();
        assert!(matches!(out, Output::NoOutput { .. }));
    }

    #[test]
    fn duplicate_keys_multiply() {
        let right = Dataset::from_rows(
            &["id", "tag"],
            vec![
                vec![Scalar::I64(1), Scalar::from("x")],
                vec![Scalar::I64(1), Scalar::from("y")],
                vec![Scalar::Null, Scalar::from("z")],
            ],
        )
        .unwrap();
        let out = Merge
            .execute(
                &[&people(), &right],
                &[names(&["id"]), names(&["id"])],
                &CancelFlag::new(),
            )
            .unwrap();
        assert_eq!(out.dataset().unwrap().num_rows(), 2);
    }

    proptest! {
        #[test]
        fn unequal_key_lists_always_rejected(a in 1usize..4, b in 1usize..4) {
            prop_assume!(a != b);
            let cols: Vec<String> = (0..4).map(|i| format!("c{}", i)).collect();
            let refs = vec![cols[..a].to_vec(), cols[..b].to_vec()];
            let res = Merge.validate_columns(&[cols.clone(), cols.clone()], &refs);
            prop_assert!(matches!(res, Err(OpError::Validation(_))));
        }
    }
}
