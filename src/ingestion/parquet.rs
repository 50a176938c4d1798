//! Parquet encoding of normalized frames.
//!
//! Every column is written as a required `BYTE_ARRAY` with the `String` logical type. A frame
//! without rows produces a file with the schema and no row groups.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use parquet::basic::{Compression, LogicalType, Repetition, Type as PhysicalType};
use parquet::data_type::{ByteArray, ByteArrayType};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::Field;
use parquet::schema::types::Type;

use crate::types::NormalizedFrame;

/// Compression codec for written Parquet objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParquetCompression {
    /// No compression.
    Uncompressed,
    /// Snappy (default).
    #[default]
    Snappy,
}

impl From<ParquetCompression> for Compression {
    fn from(c: ParquetCompression) -> Self {
        match c {
            ParquetCompression::Uncompressed => Compression::UNCOMPRESSED,
            ParquetCompression::Snappy => Compression::SNAPPY,
        }
    }
}

impl FromStr for ParquetCompression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            "snappy" => Ok(Self::Snappy),
            other => Err(format!("unknown parquet compression '{other}' (expected snappy/uncompressed)")),
        }
    }
}

impl fmt::Display for ParquetCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncompressed => f.write_str("uncompressed"),
            Self::Snappy => f.write_str("snappy"),
        }
    }
}

/// Options for [`write_parquet`].
#[derive(Debug, Clone, Default)]
pub struct ParquetWriteOptions {
    /// Compression codec.
    pub compression: ParquetCompression,
}

/// Encode `frame` as a single Parquet file held in memory.
pub fn write_parquet(frame: &NormalizedFrame, options: &ParquetWriteOptions) -> Result<Vec<u8>, ParquetError> {
    let fields = frame
        .column_names()
        .iter()
        .map(|name| {
            Type::primitive_type_builder(name, PhysicalType::BYTE_ARRAY)
                .with_repetition(Repetition::REQUIRED)
                .with_logical_type(Some(LogicalType::String))
                .build()
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let schema = Arc::new(Type::group_type_builder("schema").with_fields(fields).build()?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(options.compression.into())
            .build(),
    );

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = SerializedFileWriter::new(&mut buf, schema, props)?;
        if frame.row_count() > 0 {
            let mut rg = writer.next_row_group()?;
            let mut columns = frame.iter_columns();
            while let Some(mut col) = rg.next_column()? {
                let (name, values) = columns
                    .next()
                    .ok_or_else(|| ParquetError::General("more parquet columns than frame columns".to_string()))?;
                let data: Vec<ByteArray> = values.iter().map(|v| ByteArray::from(v.as_str())).collect();
                let written = col.typed::<ByteArrayType>().write_batch(&data, None, None)?;
                if written != frame.row_count() {
                    return Err(ParquetError::General(format!(
                        "column '{name}' wrote {written} of {} values",
                        frame.row_count()
                    )));
                }
                col.close()?;
            }
            rg.close()?;
        }
        writer.close()?;
    }
    Ok(buf)
}

/// Read a Parquet file back into a [`NormalizedFrame`].
///
/// Leaf columns become frame columns in schema order. String cells are taken as-is, nulls become
/// empty strings, and any other physical type is rendered with its display form.
pub fn read_parquet(bytes: impl Into<Bytes>) -> Result<NormalizedFrame, ParquetError> {
    let reader = SerializedFileReader::new(bytes.into())?;
    let names: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    let mut row_count = 0usize;
    for row_res in reader.get_row_iter(None)? {
        let row = row_res?;
        for (idx, (name, field)) in row.get_column_iter().enumerate() {
            let col = columns.get_mut(idx).ok_or_else(|| {
                ParquetError::General(format!("row {} has unexpected column '{name}'", row_count + 1))
            })?;
            col.push(field_to_string(field));
        }
        row_count += 1;
    }

    Ok(NormalizedFrame::from_parts(names, columns, row_count))
}

fn field_to_string(f: &Field) -> String {
    match f {
        Field::Null => String::new(),
        Field::Str(s) => s.clone(),
        other => other.to_string(),
    }
}
