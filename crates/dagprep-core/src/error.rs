use thiserror::Error;

use crate::id::{DatasetId, NodeId};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the graph model and the core data types.
///
/// `DuplicateSource`, the two arity errors, `Cycle` and `DuplicateEdge` form the
/// structural family: they are always raised at mutation time and leave the
/// graph unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("a raw source with locator '{0}' already exists")]
    DuplicateSource(String),

    #[error("{kind} expects {expected} input(s), got {got}")]
    ArityMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("cycle detected: {0}")]
    Cycle(String),

    #[error("{kind} expects {expected} reference column list(s), got {got}")]
    ReferenceArity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{from} already feeds {to}")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("{node} has no input slot {slot}")]
    InvalidSlot { node: NodeId, slot: usize },

    #[error("unknown node {0}")]
    NodeNotFound(NodeId),

    #[error("unknown dataset {0}")]
    DatasetNotFound(DatasetId),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("hashing error: {0}")]
    Hash(String),
}

impl Error {
    /// True for errors that reject a graph mutation.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::DuplicateSource(_)
                | Error::ArityMismatch { .. }
                | Error::ReferenceArity { .. }
                | Error::Cycle(_)
                | Error::DuplicateEdge { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NodeNotFound(_) | Error::DatasetNotFound(_))
    }
}
