//! Run manifest: the persisted, append-only record of one pipeline run.
//!
//! Holds metadata and provenance only; dataset contents stay in the
//! run's store and are never written here.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::hash::Hash256;
use crate::id::{DatasetId, NodeId, RunId};

/// One performed transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub node: NodeId,
    pub description: String,
    pub inputs: Vec<DatasetId>,
    pub output: DatasetId,
}

/// Final outcome as persisted. `None` while the run is still going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Failed { node: Option<NodeId>, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: RunId,

    /// Stable hash of the graph the run executed.
    pub graph_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: Option<u64>,

    /// Every dataset registered during the run, with its content digest.
    pub datasets: BTreeMap<DatasetId, Hash256>,

    /// Raw and step nodes that produced a dataset.
    pub bindings: BTreeMap<NodeId, DatasetId>,

    pub steps: Vec<StepRecord>,

    pub outcome: Option<Outcome>,
}

impl RunManifest {
    pub fn new(graph_hash: Hash256) -> Self {
        Self {
            id: RunId::new_v4(),
            graph_hash,
            engine_version: crate::VERSION.to_string(),
            started_ms: now_millis(),
            finished_ms: None,
            datasets: BTreeMap::new(),
            bindings: BTreeMap::new(),
            steps: Vec::new(),
            outcome: None,
        }
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = DatasetId> + '_ {
        self.datasets.keys().copied()
    }

    pub fn finish(&mut self, outcome: Outcome) {
        self.finished_ms = Some(now_millis());
        self.outcome = Some(outcome);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    #[test]
    fn manifest_serializes_with_outcome() {
        let mut m = RunManifest::new(hash_bytes(b"g"));
        m.datasets.insert(DatasetId::new(1), hash_bytes(b"d"));
        m.finish(Outcome::Failed {
            node: Some(NodeId::new(2)),
            reason: "merge produced no rows".into(),
        });
        let json = serde_json::to_string(&m).unwrap();
        let back: RunManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, m.id);
        assert_eq!(back.outcome, m.outcome);
        assert!(back.finished_ms.unwrap() >= back.started_ms);
        assert_eq!(back.dataset_ids().collect::<Vec<_>>(), vec![DatasetId::new(1)]);
    }
}
