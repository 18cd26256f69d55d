//! CSV files with a header row.
//!
//! Cells are typed one at a time: integer, then float, then boolean,
//! otherwise text. Empty cells (and `NA`/`NaN`/`null`) become missing.

use std::path::Path;

use dagprep_core::types::{Column, Dataset, Scalar};

use crate::error::{Error, Result};
use crate::readers::SourceReader;

#[derive(Debug, Clone)]
pub struct CsvSource {
    pub delimiter: u8,
}

impl Default for CsvSource {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

fn path_of(locator: &str) -> &Path {
    Path::new(locator.strip_prefix("file://").unwrap_or(locator))
}

impl CsvSource {
    fn reader(&self, locator: &str) -> Result<csv::Reader<std::fs::File>> {
        let path = path_of(locator);
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        Ok(csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(path)?)
    }
}

impl SourceReader for CsvSource {
    fn read(&self, locator: &str) -> Result<Dataset> {
        let mut rdr = self.reader(locator)?;
        let mut columns: Vec<Column> = rdr
            .headers()?
            .iter()
            .map(|h| Column::new(h.trim(), Vec::new()))
            .collect();

        for record in rdr.records() {
            let record = record?;
            if record.len() != columns.len() {
                return Err(Error::Invalid(format!(
                    "{}: record has {} fields, header has {}",
                    locator,
                    record.len(),
                    columns.len()
                )));
            }
            for (col, cell) in columns.iter_mut().zip(record.iter()) {
                col.values.push(parse_cell(cell));
            }
        }
        Ok(Dataset::new(columns)?)
    }

    fn columns(&self, locator: &str) -> Result<Vec<String>> {
        let mut rdr = self.reader(locator)?;
        Ok(rdr.headers()?.iter().map(|h| h.trim().to_string()).collect())
    }
}

pub fn parse_cell(raw: &str) -> Scalar {
    let s = raw.trim();
    if s.is_empty() || matches!(s, "NA" | "NaN" | "nan" | "null" | "NULL") {
        return Scalar::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Scalar::I64(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Scalar::F64(f);
    }
    match s {
        "true" | "True" | "TRUE" => Scalar::Bool(true),
        "false" | "False" | "FALSE" => Scalar::Bool(false),
        _ => Scalar::Str(s.to_string()),
    }
}
