//! One execution of a graph: its store, bindings, provenance and status.

use std::fmt;

use serde::{Deserialize, Serialize};

use dagprep_core::error::{Error, Result};
use dagprep_core::hash::Hash256;
use dagprep_core::id::{DatasetId, NodeId, RunId};
use dagprep_core::manifest::{Outcome, RunManifest, StepRecord};
use dagprep_core::types::Dataset;
use dagprep_profile::{profile_with, Profile};

use crate::store::DatasetStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The transformation legitimately produced nothing.
    NoOutput(String),
    /// Columns or references did not fit the data actually loaded.
    Validation(String),
    /// A raw source could not be read.
    Source(String),
    Cancelled,
    /// Internal engine or operator fault.
    Fault(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoOutput(m) => write!(f, "no output: {}", m),
            FailureReason::Validation(m) => write!(f, "validation: {}", m),
            FailureReason::Source(m) => write!(f, "source unavailable: {}", m),
            FailureReason::Cancelled => f.write_str("cancelled"),
            FailureReason::Fault(m) => write!(f, "fault: {}", m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed {
        node: Option<NodeId>,
        reason: FailureReason,
    },
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed { .. })
    }
}

#[derive(Debug)]
pub struct Run {
    manifest: RunManifest,
    store: DatasetStore,
    status: RunStatus,
}

impl Run {
    pub(crate) fn start(graph_hash: Hash256) -> Self {
        Self {
            manifest: RunManifest::new(graph_hash),
            store: DatasetStore::new(),
            status: RunStatus::Running,
        }
    }

    pub fn id(&self) -> RunId {
        self.manifest.id
    }

    pub fn started_ms(&self) -> u64 {
        self.manifest.started_ms
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.manifest.steps
    }

    pub fn dataset_id_for(&self, node: NodeId) -> Option<DatasetId> {
        self.manifest.bindings.get(&node).copied()
    }

    /// Dataset produced by `node` in this run.
    pub fn dataset_for(&self, node: NodeId) -> Result<&Dataset> {
        let id = self
            .dataset_id_for(node)
            .ok_or(Error::NodeNotFound(node))?;
        self.store.get_dataset(id)
    }

    /// One profile per dataset registered in the run, in id order.
    pub fn profiles(&self, top_values: usize) -> Vec<(DatasetId, Profile)> {
        self.store
            .iter()
            .map(|(id, d)| (id, profile_with(d, top_values)))
            .collect()
    }

    /// Store `dataset` as the output of `node`.
    pub(crate) fn commit(&mut self, node: NodeId, dataset: Dataset) -> DatasetId {
        let digest = dataset.digest();
        let id = self.store.add_dataset(dataset);
        self.manifest.datasets.insert(id, digest);
        self.manifest.bindings.insert(node, id);
        id
    }

    pub(crate) fn record_step(&mut self, step: StepRecord) {
        self.manifest.steps.push(step);
    }

    pub(crate) fn complete(&mut self) {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Completed;
            self.manifest.finish(Outcome::Completed);
        }
    }

    pub(crate) fn fail(&mut self, node: Option<NodeId>, reason: FailureReason) {
        if self.status == RunStatus::Running {
            self.manifest.finish(Outcome::Failed {
                node,
                reason: reason.to_string(),
            });
            self.status = RunStatus::Failed { node, reason };
        }
    }
}
