//! Ingestion engine and its building blocks.
//!
//! Most callers should use [`IngestionEngine`], which:
//!
//! - checks the source type by extension ([`FileKind`])
//! - loads the source into an in-memory [`crate::types::TabularFrame`]
//! - [`normalize`]s every column to strings
//! - writes one Parquet object and reports the outcome to an [`IngestionObserver`]
//!
//! Loaders and the codec are also available on their own under:
//! - [`csv`]
//! - [`excel`] (Cargo feature `excel`)
//! - [`parquet`]

pub mod csv;
pub mod engine;
#[cfg(feature = "excel")]
pub mod excel;
pub(crate) mod headers;
pub mod normalize;
pub mod observability;
pub mod parquet;
pub mod source;

pub use engine::IngestionEngine;
pub use normalize::normalize;
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, LevelFilter,
    NoopObserver, TracingObserver,
};
pub use parquet::{read_parquet, write_parquet, ParquetCompression, ParquetWriteOptions};
pub use source::{FileKind, SourceDescriptor, SourceKind};
