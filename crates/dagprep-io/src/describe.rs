//! Provenance descriptions for step records.
//!
//! A `Describer` may be backed by anything (a template, a remote text
//! generator). Returning `None` means "unavailable"; the engine then uses
//! [`default_description`], so a missing describer never fails a run.

use dagprep_core::id::DatasetId;
use dagprep_core::kind::TransformKind;
use dagprep_core::types::Dataset;

/// A dataset handed to a describer: its id in the run and its contents.
pub type Described<'a> = (DatasetId, &'a Dataset);

pub trait Describer: Send + Sync {
    fn describe(
        &self,
        kind: TransformKind,
        inputs: &[Described<'_>],
        output: Described<'_>,
    ) -> Option<String>;
}

/// `"<display name> of dataset(s) 1, 2 -> 3"`.
pub fn default_description(kind: TransformKind, inputs: &[DatasetId], output: DatasetId) -> String {
    let ids: Vec<String> = inputs.iter().map(|d| d.get().to_string()).collect();
    format!(
        "{} of dataset(s) {} -> {}",
        kind.display_name(),
        ids.join(", "),
        output.get()
    )
}

/// Always produces [`default_description`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateDescriber;

impl Describer for TemplateDescriber {
    fn describe(
        &self,
        kind: TransformKind,
        inputs: &[Described<'_>],
        output: Described<'_>,
    ) -> Option<String> {
        let ids: Vec<DatasetId> = inputs.iter().map(|(id, _)| *id).collect();
        Some(default_description(kind, &ids, output.0))
    }
}

/// Mentions shapes, e.g. `"Deduplicate: dataset 1 (3 rows) -> dataset 2 (2 rows)"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryDescriber;

impl Describer for SummaryDescriber {
    fn describe(
        &self,
        kind: TransformKind,
        inputs: &[Described<'_>],
        output: Described<'_>,
    ) -> Option<String> {
        let shape = |(id, d): &Described<'_>| format!("dataset {} ({} rows)", id.get(), d.num_rows());
        let ins: Vec<String> = inputs.iter().map(shape).collect();
        Some(format!(
            "{}: {} -> {}",
            kind.display_name(),
            ins.join(" + "),
            shape(&output)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagprep_core::types::Scalar;

    #[test]
    fn default_template() {
        let s = default_description(
            TransformKind::Merge,
            &[DatasetId::new(1), DatasetId::new(2)],
            DatasetId::new(3),
        );
        assert_eq!(s, "Merge of dataset(s) 1, 2 -> 3");
    }

    #[test]
    fn summary_mentions_row_counts() {
        let a = Dataset::from_rows(&["x"], vec![vec![Scalar::I64(1)], vec![Scalar::I64(1)]]).unwrap();
        let b = Dataset::from_rows(&["x"], vec![vec![Scalar::I64(1)]]).unwrap();
        let s = SummaryDescriber
            .describe(
                TransformKind::Deduplicate,
                &[(DatasetId::new(1), &a)],
                (DatasetId::new(2), &b),
            )
            .unwrap();
        assert_eq!(s, "Deduplicate: dataset 1 (2 rows) -> dataset 2 (1 rows)");
    }
}
