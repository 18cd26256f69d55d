//! NDJSON dataset export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::Result;
use dagprep_core::types::{Dataset, Scalar};

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl JsonlWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// One JSON object per row.
    pub fn write_dataset(&mut self, data: &Dataset) -> Result<()> {
        for r in 0..data.num_rows() {
            let mut obj = Map::new();
            for col in data.columns() {
                obj.insert(col.name.clone(), scalar_to_json(&col.values[r]));
            }
            serde_json::to_writer(&mut self.writer, &Value::Object(obj))?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

fn scalar_to_json(v: &Scalar) -> Value {
    match v {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::I64(i) => Value::from(*i),
        // NaN has no JSON form; it is already "missing".
        Scalar::F64(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Scalar::Str(s) => Value::String(s.clone()),
    }
}
