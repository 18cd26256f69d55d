#![forbid(unsafe_code)]
//! dagprep-io: adapters for everything the engine consumes from outside.
//!
//! - `readers`: turn a source locator into a [`Dataset`](dagprep_core::types::Dataset)
//!   (CSV files, or datasets registered in memory under `memory://`).
//! - `describe`: human-readable provenance strings for step records.
//! - `catalog`: durable run metadata and per-dataset profiles (JSON files).
//! - `writers`: dataset export.

pub mod catalog;
pub mod describe;
pub mod error;
pub mod readers;
pub mod writers;

pub use catalog::{JsonCatalog, RunLoader, RunSink, RunSummary};
pub use describe::{default_description, Describer, SummaryDescriber, TemplateDescriber};
pub use error::{Error, Result};
pub use readers::{CsvSource, MemorySource, RoutedSource, SourceReader};
