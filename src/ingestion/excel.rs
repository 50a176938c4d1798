#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::BoxError;
use crate::types::{TabularFrame, Value};

use super::headers::normalize_headers;

/// Load the first sheet of a workbook (`.xlsx`, `.xls`) into a [`TabularFrame`].
///
/// Behavior:
/// - The workbook format is detected from the content, not the name
/// - The first non-empty row is the header row
/// - Cells keep their spreadsheet type: numbers, booleans, text; dates render as
///   `YYYY-MM-DD HH:MM:SS`
pub fn load_first_sheet_from_bytes(bytes: &[u8]) -> Result<TabularFrame, BoxError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| format!("cannot open workbook: {e}"))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or("workbook has no sheets")?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| format!("cannot read sheet '{first}': {e}"))?;

    load_sheet_range(&first, &range)
}

fn load_sheet_range(sheet: &str, range: &Range<Data>) -> Result<TabularFrame, BoxError> {
    let mut rows_iter = range.rows().skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let header = rows_iter
        .next()
        .ok_or_else(|| format!("sheet '{sheet}' has no non-empty rows (no header row found)"))?;
    let names = normalize_headers(header.iter().map(cell_to_header_string).collect());

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(TabularFrame::from_rows(names, rows))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Int64(*i),
        // Excel stores every number as a double; whole numbers read back as integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::Int64(*f as i64),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if dt.is_datetime() => Value::Utf8(ts.to_string()),
            _ => Value::Utf8(dt.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::Error(_) => Value::Utf8(c.to_string()),
    }
}
