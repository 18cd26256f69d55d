#![forbid(unsafe_code)]
//! dagprep-core: shared vocabulary for the preprocessing engine.
//!
//! Holds the strongly-typed ids, the scalar/column/dataset model, the
//! pipeline graph (arena of raw-source and step nodes), run manifests,
//! configuration, hashing and the cancellation flag. No IO happens here.

pub mod cancel;
pub mod config;
pub mod error;
pub mod graph;
pub mod hash;
pub mod id;
pub mod kind;
pub mod manifest;
pub mod prelude;
pub mod types;

/// Engine version string recorded in every run manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
