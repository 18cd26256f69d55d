//! Durable run catalog.
//!
//! Layout under the catalog root:
//!
//! ```text
//! runs/<run_id>.json                     run manifest
//! profiles/<run_id>/<dataset_id>.json    one profile per dataset
//! ```
//!
//! Every file is written to a hidden temp file first and renamed into
//! place. Profiles already on disk are left alone.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use dagprep_core::id::{DatasetId, RunId};
use dagprep_core::manifest::{Outcome, RunManifest};
use dagprep_profile::Profile;

use crate::error::{Error, Result};

/// Persists a finished run.
pub trait RunSink {
    fn persist(&self, manifest: &RunManifest, profiles: &[(DatasetId, Profile)]) -> Result<()>;
}

/// Reads run metadata back (never dataset contents).
pub trait RunLoader {
    fn load_run(&self, id: RunId) -> Result<RunManifest>;
    fn list_runs(&self) -> Result<Vec<RunSummary>>;
    fn load_profile(&self, run: RunId, dataset: DatasetId) -> Result<Profile>;
}

/// What a picker needs to choose a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub started_ms: u64,
    pub datasets: usize,
    pub steps: usize,
    pub outcome: Option<Outcome>,
}

impl From<&RunManifest> for RunSummary {
    fn from(m: &RunManifest) -> Self {
        Self {
            id: m.id,
            started_ms: m.started_ms,
            datasets: m.datasets.len(),
            steps: m.steps.len(),
            outcome: m.outcome.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonCatalog {
    root: PathBuf,
}

impl JsonCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_path(&self, id: RunId) -> PathBuf {
        self.root.join("runs").join(format!("{}.json", id))
    }

    fn profile_path(&self, run: RunId, dataset: DatasetId) -> PathBuf {
        self.root
            .join("profiles")
            .join(run.to_string())
            .join(format!("{}.json", dataset.get()))
    }
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Invalid(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(parent)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("catalog");
    let tmp = parent.join(format!(".{}.tmp", name));

    let mut file = File::create(&tmp)?;
    {
        let mut writer = BufWriter::new(&mut file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

impl RunSink for JsonCatalog {
    fn persist(&self, manifest: &RunManifest, profiles: &[(DatasetId, Profile)]) -> Result<()> {
        if !manifest.is_finished() {
            return Err(Error::Invalid(format!("run {} has not finished", manifest.id)));
        }
        write_atomic(&self.run_path(manifest.id), manifest)?;

        let mut written = 0usize;
        for (dataset, profile) in profiles {
            let path = self.profile_path(manifest.id, *dataset);
            if path.exists() {
                tracing::debug!(run = %manifest.id, dataset = %dataset, "profile already stored");
                continue;
            }
            write_atomic(&path, profile)?;
            written += 1;
        }
        tracing::info!(
            run = %manifest.id,
            profiles = written,
            root = %self.root.display(),
            "run persisted"
        );
        Ok(())
    }
}

impl RunLoader for JsonCatalog {
    fn load_run(&self, id: RunId) -> Result<RunManifest> {
        read_json(&self.run_path(id))
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let dir = self.root.join("runs");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_run = path.extension().and_then(|e| e.to_str()) == Some("json")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_run {
                continue;
            }
            let manifest: RunManifest = read_json(&path)?;
            out.push(RunSummary::from(&manifest));
        }
        out.sort_by(|a, b| a.started_ms.cmp(&b.started_ms).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn load_profile(&self, run: RunId, dataset: DatasetId) -> Result<Profile> {
        read_json(&self.profile_path(run, dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagprep_core::hash::hash_bytes;
    use dagprep_core::types::{Dataset, Scalar};
    use dagprep_profile::profile;

    fn finished_manifest() -> RunManifest {
        let mut m = RunManifest::new(hash_bytes(b"graph"));
        m.datasets.insert(DatasetId::new(1), hash_bytes(b"d1"));
        m.finish(Outcome::Completed);
        m
    }

    #[test]
    fn persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::new(dir.path());
        let m = finished_manifest();
        let d = Dataset::from_rows(&["x"], vec![vec![Scalar::I64(3)]]).unwrap();
        let p = profile(&d);

        catalog.persist(&m, &[(DatasetId::new(1), p.clone())]).unwrap();

        let back = catalog.load_run(m.id).unwrap();
        assert_eq!(back.id, m.id);
        assert_eq!(back.outcome, Some(Outcome::Completed));
        assert_eq!(catalog.load_profile(m.id, DatasetId::new(1)).unwrap(), p);

        let runs = catalog.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].datasets, 1);
    }

    #[test]
    fn existing_profiles_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::new(dir.path());
        let m = finished_manifest();
        let first = profile(&Dataset::from_rows(&["x"], vec![vec![Scalar::I64(1)]]).unwrap());
        let second = profile(&Dataset::from_rows(&["y"], vec![]).unwrap());

        catalog.persist(&m, &[(DatasetId::new(1), first.clone())]).unwrap();
        catalog.persist(&m, &[(DatasetId::new(1), second)]).unwrap();
        assert_eq!(catalog.load_profile(m.id, DatasetId::new(1)).unwrap(), first);
    }

    #[test]
    fn unfinished_runs_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::new(dir.path());
        let m = RunManifest::new(hash_bytes(b"graph"));
        assert!(matches!(catalog.persist(&m, &[]), Err(Error::Invalid(_))));
    }

    #[test]
    fn unknown_run_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::new(dir.path());
        assert!(matches!(
            catalog.load_run(RunId::new_v4()),
            Err(Error::NotFound(_))
        ));
        assert!(catalog.list_runs().unwrap().is_empty());
    }
}
