//! Write-once dataset storage for a single run.

use dagprep_core::error::{Error, Result};
use dagprep_core::id::DatasetId;
use dagprep_core::types::Dataset;

/// Append-only. Ids are handed out sequentially from 1 and map directly to
/// positions in the backing vector.
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: Vec<Dataset>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `dataset`; the caller keeps no handle to mutate it.
    pub fn add_dataset(&mut self, dataset: Dataset) -> DatasetId {
        self.datasets.push(dataset);
        DatasetId::new(self.datasets.len() as u64)
    }

    pub fn get_dataset(&self, id: DatasetId) -> Result<&Dataset> {
        (id.get() as usize)
            .checked_sub(1)
            .and_then(|i| self.datasets.get(i))
            .ok_or(Error::DatasetNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DatasetId, &Dataset)> {
        self.datasets
            .iter()
            .enumerate()
            .map(|(i, d)| (DatasetId::new(i as u64 + 1), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagprep_core::types::Scalar;

    #[test]
    fn ids_are_sequential_from_one() {
        let mut store = DatasetStore::new();
        let d = Dataset::from_rows(&["a"], vec![vec![Scalar::I64(1)]]).unwrap();
        assert_eq!(store.add_dataset(d.clone()), DatasetId::new(1));
        assert_eq!(store.add_dataset(d.clone()), DatasetId::new(2));
        assert_eq!(store.get_dataset(DatasetId::new(2)).unwrap(), &d);
        assert_eq!(store.iter().count(), 2);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = DatasetStore::new();
        for raw in [0, 1, 42] {
            let err = store.get_dataset(DatasetId::new(raw)).unwrap_err();
            assert_eq!(err, Error::DatasetNotFound(DatasetId::new(raw)));
        }
    }
}
