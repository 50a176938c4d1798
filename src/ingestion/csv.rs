//! Delimited-text (CSV) loading.

use std::io::Read;

use crate::error::BoxError;
use crate::types::{TabularFrame, Value};

use super::headers::normalize_headers;

/// Load CSV bytes into a [`TabularFrame`].
///
/// Rules:
///
/// - comma delimiter, `"` quoting, first record is the header
/// - every cell is kept as text; an empty cell becomes [`Value::Null`]
/// - rows shorter than the header are padded with nulls, longer rows are an error
pub fn load_csv_from_bytes(bytes: &[u8]) -> Result<TabularFrame, BoxError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    load_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
pub fn load_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> Result<TabularFrame, BoxError> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err("delimited source has no header row".into());
    }
    let names = normalize_headers(headers.iter().map(str::to_string).collect());
    let width = names.len();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        if record.len() > width {
            return Err(format!(
                "row {user_row} has {} fields but the header has {width}",
                record.len()
            )
            .into());
        }

        let row = record
            .iter()
            .map(|raw| {
                if raw.is_empty() {
                    Value::Null
                } else {
                    Value::Utf8(raw.to_owned())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(TabularFrame::from_rows(names, rows))
}
