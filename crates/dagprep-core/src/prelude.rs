//! Convenient re-exports for downstream crates.

pub use crate::cancel::CancelFlag;
pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::graph::{Edge, Graph, Node, NodeKind};
pub use crate::hash::Hash256;
pub use crate::id::{DatasetId, NodeId, RunId};
pub use crate::kind::TransformKind;
pub use crate::manifest::{Outcome, RunManifest, StepRecord};
pub use crate::types::{Column, Dataset, Scalar};
