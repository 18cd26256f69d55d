//! Provenance helpers.
//!
//! The manifest records a hash of the serialized graph. Given the same graph
//! and the same source contents, the engine registers the same datasets in
//! the same order, so two manifests can be compared for reproducibility.

use dagprep_core::graph::Graph;
use dagprep_core::hash::{hash_serde, Hash256};
use dagprep_core::manifest::RunManifest;

use crate::ExecError;

pub fn hash_graph(graph: &Graph) -> Result<Hash256, ExecError> {
    Ok(hash_serde(graph)?)
}

/// True when `manifest` was produced from exactly this graph.
pub fn produced_by(manifest: &RunManifest, graph: &Graph) -> Result<bool, ExecError> {
    Ok(manifest.graph_hash == hash_graph(graph)?)
}

/// True when both runs executed the same graph and registered identical
/// datasets under identical ids.
pub fn same_outputs(a: &RunManifest, b: &RunManifest) -> bool {
    a.graph_hash == b.graph_hash && a.datasets == b.datasets
}
