//! Row/column value model shared by transforms, the store and profiling.
//!
//! Kept deliberately small: a dataset is a list of named columns of
//! `Scalar` cells, all the same length.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::Hash256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl Scalar {
    /// Null and NaN both count as a missing cell.
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::F64(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::I64(_) | Scalar::F64(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::I64(v) => Some(*v as f64),
            Scalar::F64(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// Collapse integral floats onto integers so `1.0` and `1` compare
    /// equal as join keys.
    pub fn normalized(&self) -> Scalar {
        match self {
            Scalar::F64(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Scalar::I64(*v as i64)
            }
            other => other.clone(),
        }
    }

    fn type_order(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::I64(_) => 2,
            Scalar::F64(_) => 3,
            Scalar::Str(_) => 4,
        }
    }
}

fn f64_key(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::I64(a), Scalar::I64(b)) => a == b,
            (Scalar::F64(a), Scalar::F64(b)) => f64_key(*a) == f64_key(*b),
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_order().hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::I64(i) => i.hash(state),
            Scalar::F64(f) => f64_key(*f).hash(state),
            Scalar::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::I64(i) => write!(f, "{}", i),
            Scalar::F64(v) => write!(f, "{}", v),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// Total order over scalars: missing first, then by type, then by value.
pub fn scalar_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    use Scalar::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Bool(x), Bool(y)) => x.cmp(y),
        (I64(x), I64(y)) => x.cmp(y),
        (F64(x), F64(y)) => x.total_cmp(y),
        (Str(x), Str(y)) => x.cmp(y),
        _ => a.type_order().cmp(&b.type_order()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric when every present cell is numeric. Empty and all-missing
    /// columns count as numeric.
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .filter(|v| !v.is_missing())
            .all(Scalar::is_numeric)
    }

    pub fn present(&self) -> impl Iterator<Item = &Scalar> {
        self.values.iter().filter(|v| !v.is_missing())
    }
}

/// Immutable tabular value. Construction validates shape; there is no
/// mutable access afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(Error::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].iter().any(|p| p.name == c.name) {
                return Err(Error::Schema(format!("duplicate column '{}'", c.name)));
            }
        }
        Ok(Self { columns })
    }

    /// Build from row tuples; every row must have one cell per name.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Scalar>>) -> Result<Self> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new(n.as_ref(), Vec::with_capacity(rows.len())))
            .collect();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::Schema(format!(
                    "row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    columns.len()
                )));
            }
            for (col, cell) in columns.iter_mut().zip(row) {
                col.values.push(cell);
            }
        }
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn row(&self, idx: usize) -> Vec<Scalar> {
        self.columns.iter().map(|c| c.values[idx].clone()).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Scalar>> + '_ {
        (0..self.num_rows()).map(move |i| self.row(i))
    }

    /// Content hash over column names and every cell, in order.
    pub fn digest(&self) -> Hash256 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.columns.len() as u64).to_le_bytes());
        for col in &self.columns {
            hasher.update(col.name.as_bytes());
            hasher.update(&[0xff]);
            for v in &col.values {
                hash_scalar(v, &mut hasher);
            }
        }
        hasher.into()
    }
}

fn hash_scalar(scalar: &Scalar, hasher: &mut blake3::Hasher) {
    use Scalar::*;

    hasher.update(&[scalar.type_order()]);
    match scalar {
        Null => {}
        Bool(b) => {
            hasher.update(&[*b as u8]);
        }
        I64(i) => {
            hasher.update(&i.to_le_bytes());
        }
        F64(f) => {
            hasher.update(&f64_key(*f).to_le_bytes());
        }
        Str(s) => {
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
    }
}
