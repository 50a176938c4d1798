//! Column-type normalization.
//!
//! Every loaded column is coerced to strings, preserving column and row order. Loader type
//! inference differs across CSV, spreadsheets and database drivers; writing every column as a
//! string keeps the output schema stable and leaves typed parsing to the consumer.

use crate::types::{NormalizedFrame, TabularFrame};

/// Coerce every cell of `frame` to its string representation.
///
/// See [`crate::types::Value::to_normalized_string`] for the per-value rules.
pub fn normalize(frame: TabularFrame) -> NormalizedFrame {
    let row_count = frame.row_count();
    let mut names = Vec::with_capacity(frame.column_count());
    let mut columns = Vec::with_capacity(frame.column_count());
    for col in frame.into_columns() {
        columns.push(col.values.iter().map(|v| v.to_normalized_string()).collect());
        names.push(col.name);
    }
    NormalizedFrame::from_parts(names, columns, row_count)
}
