#![forbid(unsafe_code)]
//! dagprep: assemble preprocessing steps as a DAG, run them in dependency
//! order, and compare the resulting datasets.
//!
//! This crate only re-exports the workspace members:
//! - `dagprep_core`: ids, datasets, the graph model, manifests, config
//! - `dagprep_operators`: deduplicate / impute / merge and their registry
//! - `dagprep_profile`: dataset profiles and profile diffs
//! - `dagprep_io`: source readers, describers, the run catalog
//! - `dagprep_exec`: dataset store, runs, and the engine

pub use dagprep_core;
pub use dagprep_exec;
pub use dagprep_io;
pub use dagprep_operators;
pub use dagprep_profile;

pub use dagprep_core::prelude::*;
pub use dagprep_exec::{Engine, ExecError, Run, RunStatus};
