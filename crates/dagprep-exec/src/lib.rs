#![forbid(unsafe_code)]
//! dagprep-exec: dataset store, run records, and the engine.
//!
//! The engine walks a graph generation by generation (ascending node id
//! within a generation), one node at a time, and appends everything it
//! produces to the current [`Run`]. A run is replaced wholesale by the next
//! `run_pipeline` call; nothing already committed to it is ever rewritten.

pub mod metrics;
pub mod replay;
pub mod run;
pub mod runtime;
pub mod store;

pub use run::{FailureReason, Run, RunStatus};
pub use runtime::{Engine, ExecError};
pub use store::DatasetStore;
