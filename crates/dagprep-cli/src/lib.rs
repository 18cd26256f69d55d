#![forbid(unsafe_code)]
//! dagprep-cli: YAML pipeline files and the `dagprep` binary.

pub mod pipeline;

pub use pipeline::{load_pipeline, parse_pipeline, ParsedPipeline, PipelineError};
