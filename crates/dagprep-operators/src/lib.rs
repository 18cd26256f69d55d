#![forbid(unsafe_code)]
//! dagprep-operators: the built-in transformations.
//!
//! Each `TransformKind` maps to exactly one struct implementing
//! [`Transform`]; the [`Registry`] selects it with a `match`, so there is no
//! lookup by name anywhere on the execution path.
//!
//! Everything here is pure and synchronous. Transforms read borrowed input
//! datasets and build a fresh output; they never touch the store.

pub mod dedup;
pub mod impute;
pub mod merge;
pub mod registry;
pub mod traits;

pub use registry::Registry;
pub use traits::{OpError, Output, Transform};
