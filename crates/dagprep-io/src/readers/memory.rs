//! In-memory sources, for tests and embedding callers that already hold
//! their data.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use dagprep_core::types::Dataset;

use crate::error::{Error, Result};
use crate::readers::SourceReader;

pub const SCHEME: &str = "memory://";

/// Thread-safe map from locator to dataset. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Arc<Mutex<HashMap<String, Dataset>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dataset` under `locator`, replacing any previous entry.
    pub fn insert(&self, locator: impl Into<String>, dataset: Dataset) {
        self.lock().insert(locator.into(), dataset);
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.lock().contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Dataset>> {
        // The map holds plain values; a poisoned lock still has usable data.
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SourceReader for MemorySource {
    fn read(&self, locator: &str) -> Result<Dataset> {
        self.lock()
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no in-memory source '{}'", locator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagprep_core::types::Scalar;

    #[test]
    fn insert_then_read() {
        let src = MemorySource::new();
        let d = Dataset::from_rows(&["a"], vec![vec![Scalar::I64(1)]]).unwrap();
        src.clone().insert("memory://a", d.clone());
        assert!(src.contains("memory://a"));
        assert_eq!(src.read("memory://a").unwrap(), d);
        assert!(matches!(src.read("memory://b"), Err(Error::NotFound(_))));
    }
}
