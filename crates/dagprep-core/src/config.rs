//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Neighbours averaged by the KNN imputer.
    pub impute_neighbors: usize,

    /// Length of the frequency table kept for categorical columns.
    pub profile_top_values: usize,

    /// Directory of the JSON run catalog, if runs should be persisted.
    pub catalog_dir: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            impute_neighbors: 5,
            profile_top_values: 10,
            catalog_dir: None,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `DAGPREP_IMPUTE_NEIGHBORS`: neighbours used by imputation
    /// - `DAGPREP_PROFILE_TOP_VALUES`: categorical frequency table length
    /// - `DAGPREP_CATALOG_DIR`: run catalog directory
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("DAGPREP_IMPUTE_NEIGHBORS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.impute_neighbors = v;
            }
        }

        if let Ok(s) = std::env::var("DAGPREP_PROFILE_TOP_VALUES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.profile_top_values = v;
            }
        }

        if let Ok(s) = std::env::var("DAGPREP_CATALOG_DIR") {
            cfg.catalog_dir = Some(s);
        }

        cfg
    }

    /// Overlay the fields an embedded pipeline config sets explicitly.
    pub fn merge(&mut self, other: &PartialConfig) {
        if let Some(k) = other.impute_neighbors {
            self.impute_neighbors = k;
        }
        if let Some(n) = other.profile_top_values {
            self.profile_top_values = n;
        }
        if let Some(dir) = &other.catalog_dir {
            self.catalog_dir = Some(dir.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.impute_neighbors == 0 {
            return Err(Error::Config("impute_neighbors must be at least 1".into()));
        }
        Ok(())
    }
}

/// Config block as written in a pipeline file; absent keys keep the
/// environment/default value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub impute_neighbors: Option<usize>,
    pub profile_top_values: Option<usize>,
    pub catalog_dir: Option<String>,
}
