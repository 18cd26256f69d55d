//! Per-node timing events.
//!
//! Emitted at debug level under the `dagprep::metrics` target; wire a
//! subscriber filter to that target to collect them.

use std::time::Duration;

use dagprep_core::id::{DatasetId, NodeId};

pub fn node_finished(node: NodeId, label: &str, output: Option<DatasetId>, elapsed: Duration) {
    tracing::debug!(
        target: "dagprep::metrics",
        node = %node,
        label,
        output = ?output,
        elapsed_us = elapsed.as_micros() as u64,
        "node finished"
    );
}
