//! Core data model types for ingestion.
//!
//! Loaders produce a [`TabularFrame`] of loosely typed [`Value`]s. Normalization turns it into a
//! [`NormalizedFrame`] where every cell is a `String`; only the latter can be serialized.

use thiserror::Error;

/// A single cell as produced by a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// String representation used by normalization.
    ///
    /// `Null` renders as the empty string; floats use the shortest representation that
    /// round-trips (`2.0` renders as `2`).
    pub fn to_normalized_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Utf8(s) => s.clone(),
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Cell values in row order.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// In-memory tabular data: ordered named columns sharing one row count.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularFrame {
    columns: Vec<Column>,
    row_count: usize,
}

impl TabularFrame {
    /// Create a frame from columns.
    ///
    /// Fails if the columns do not all have the same length.
    pub fn try_new(columns: Vec<Column>) -> Result<Self, RaggedColumns> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(RaggedColumns {
                column: bad.name.clone(),
                len: bad.values.len(),
                expected: row_count,
            });
        }
        Ok(Self { columns, row_count })
    }

    /// Build a column-major frame from a header and row-major data.
    ///
    /// Short rows are padded with [`Value::Null`]; cells beyond the header width are dropped, so
    /// loaders must reject long rows themselves if that is an error for them.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for col in columns.iter_mut() {
                col.values.push(cells.next().unwrap_or(Value::Null));
            }
        }

        Self { columns, row_count }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

/// Columns of different lengths passed to [`TabularFrame::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column '{column}' has {len} values, expected {expected}")]
pub struct RaggedColumns {
    /// First column whose length differs from the first column's.
    pub column: String,
    /// Its length.
    pub len: usize,
    /// Length of the first column.
    pub expected: usize,
}

/// A frame whose cells have all been coerced to strings.
///
/// Produced by [`crate::ingestion::normalize`] or by reading a Parquet object back with
/// [`crate::ingestion::parquet::read_parquet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFrame {
    names: Vec<String>,
    columns: Vec<Vec<String>>,
    row_count: usize,
}

impl NormalizedFrame {
    pub(crate) fn from_parts(names: Vec<String>, columns: Vec<Vec<String>>, row_count: usize) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == row_count));
        Self {
            names,
            columns,
            row_count,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Values of the column called `name`, if present.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// The row at `idx`, as a vector of cell references.
    pub fn row(&self, idx: usize) -> Option<Vec<&str>> {
        if idx >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| c[idx].as_str()).collect())
    }
}
