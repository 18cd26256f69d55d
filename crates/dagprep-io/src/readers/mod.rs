//! Raw-source readers.

pub mod csv;
pub mod memory;

pub use self::csv::CsvSource;
pub use self::memory::MemorySource;

use dagprep_core::types::Dataset;

use crate::error::Result;

/// Given a locator, produce the dataset it names. Readers never see the
/// graph; they only resolve locators.
pub trait SourceReader: Send + Sync {
    fn read(&self, locator: &str) -> Result<Dataset>;

    /// Column names without keeping the rows around.
    fn columns(&self, locator: &str) -> Result<Vec<String>> {
        Ok(self.read(locator)?.column_names())
    }
}

/// `memory://` locators go to the in-memory source, everything else is
/// read as CSV from disk.
#[derive(Debug, Clone, Default)]
pub struct RoutedSource {
    pub memory: MemorySource,
    pub csv: CsvSource,
}

impl RoutedSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceReader for RoutedSource {
    fn read(&self, locator: &str) -> Result<Dataset> {
        if locator.starts_with(memory::SCHEME) {
            self.memory.read(locator)
        } else {
            self.csv.read(locator)
        }
    }

    fn columns(&self, locator: &str) -> Result<Vec<String>> {
        if locator.starts_with(memory::SCHEME) {
            self.memory.columns(locator)
        } else {
            self.csv.columns(locator)
        }
    }
}
