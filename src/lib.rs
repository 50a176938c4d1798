//! `datalake-ingest` converts CSV files, spreadsheets and SQL query results into Parquet objects
//! for a data lake. Every output column is stored as a string.
//!
//! The primary entrypoint is [`handler::Handler::handle`], which takes a JSON request and runs it
//! to completion. Two request shapes are accepted:
//!
//! - **file**: `{"source_loc": "<bucket>[/<folder>]", "target_loc": "<bucket>[/<folder>]"}`
//!   converts every `.csv`, `.xlsx` and `.xls` object directly under the source folder; other
//!   objects are skipped.
//! - **db**: `{"query": "...", "db_url": "...", "target_loc": "...", "credentials": {...}}` runs
//!   one read-only query and writes `<table>.parquet`, where `<table>` is the token after the
//!   first `from ` in the query.
//!
//! Output objects are named after their source with the extension replaced by `.parquet`, all
//! lowercase:
//!
//! ```rust
//! use datalake_ingest::paths::TargetPath;
//!
//! let target = TargetPath::new("gs", "Lake", "Raw/Sales", "Orders_2024.parquet").unwrap();
//! assert_eq!(target.to_string(), "gs://lake/raw/sales/orders_2024.parquet");
//! ```
//!
//! ## Running jobs directly
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use datalake_ingest::db::DisabledConnector;
//! use datalake_ingest::ingestion::{read_parquet, IngestionEngine};
//! use datalake_ingest::paths::TargetPath;
//! use datalake_ingest::storage::MemoryObjectStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryObjectStore::new());
//! store.insert("landing", "in/people.csv", "id,name\n1,Ada\n2,\n");
//!
//! let engine = IngestionEngine::new(store.clone(), Arc::new(DisabledConnector));
//! let target = TargetPath::new("mem", "lake", "out", "people.parquet")?;
//! let stats = engine.ingest_delimited("mem://landing/in/people.csv", &target)?;
//! assert_eq!(stats.rows, 2);
//!
//! let written = store.object("lake", "out/people.parquet").unwrap();
//! let frame = read_parquet(written)?;
//! assert_eq!(frame.column("name").unwrap(), ["Ada", ""]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`handler`]: request in, response message out
//! - [`router`]: request validation and job planning
//! - [`ingestion`]: the engine, loaders, normalization, Parquet codec and observers
//! - [`paths`]: object naming and addressing
//! - [`storage`]: object store trait and implementations
//! - [`db`]: database connector traits and the scoped connection guard
//! - [`config`] / [`logging`]: environment configuration and observer setup
//! - [`types`]: in-memory frames
//! - [`error`]: error types

pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod ingestion;
pub mod logging;
pub mod paths;
pub mod router;
pub mod storage;
pub mod types;

pub use error::{IngestionError, IngestionResult};
