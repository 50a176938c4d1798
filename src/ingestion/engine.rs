//! The ingestion engine: load one source, normalize it, write one Parquet object.
//!
//! Each operation follows the same steps:
//!
//! 1. check the source type (file operations only)
//! 2. load the whole source into a [`crate::types::TabularFrame`]
//! 3. [`normalize`] every column to strings
//! 4. encode Parquet in memory and write it to the [`TargetPath`]
//!
//! Nothing is written unless steps 1-3 and the encoding succeed, so a failed job never leaves a
//! partial object behind.

use std::fmt;
use std::sync::Arc;

use crate::db::{Credentials, DatabaseConnector, ScopedConnection};
use crate::error::{BoxError, IngestionError, IngestionResult};
use crate::paths::{ObjectUri, TargetPath};
use crate::storage::ObjectStore;
use crate::types::TabularFrame;

use super::normalize::normalize;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, NoopObserver};
use super::parquet::{write_parquet, ParquetWriteOptions};
use super::source::{redact_connection_string, FileKind, SourceDescriptor, SourceKind};

/// Converts sources into Parquet objects.
///
/// The engine holds no per-job state; one instance can run any number of jobs.
pub struct IngestionEngine {
    store: Arc<dyn ObjectStore>,
    connector: Arc<dyn DatabaseConnector>,
    observer: Arc<dyn IngestionObserver>,
    parquet: ParquetWriteOptions,
    alert_at_or_above: IngestionSeverity,
}

impl IngestionEngine {
    /// Create an engine reading and writing through `store` and querying through `connector`.
    pub fn new(store: Arc<dyn ObjectStore>, connector: Arc<dyn DatabaseConnector>) -> Self {
        Self {
            store,
            connector,
            observer: Arc::new(NoopObserver),
            parquet: ParquetWriteOptions::default(),
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }

    /// Attach the logging handle.
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Override Parquet writer options.
    pub fn with_parquet_options(mut self, options: ParquetWriteOptions) -> Self {
        self.parquet = options;
        self
    }

    /// Severity at or above which failures are also reported through `on_alert`.
    pub fn with_alert_threshold(mut self, severity: IngestionSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    /// Run one job, dispatching on the source variant.
    pub fn ingest(&self, source: &SourceDescriptor, target: &TargetPath) -> IngestionResult<IngestionStats> {
        match source {
            SourceDescriptor::File {
                uri,
                kind: FileKind::Delimited,
            } => self.ingest_delimited(uri, target),
            SourceDescriptor::File {
                uri,
                kind: FileKind::Spreadsheet,
            } => self.ingest_spreadsheet(uri, target),
            SourceDescriptor::Query {
                query,
                connection_string,
                credentials,
            } => self.ingest_query(query, connection_string, target, credentials.as_ref()),
        }
    }

    /// Convert a CSV object. Fails with [`IngestionError::InvalidSourceType`] unless the
    /// extension is `csv`.
    pub fn ingest_delimited(&self, source_uri: &str, target: &TargetPath) -> IngestionResult<IngestionStats> {
        let ctx = self.context(source_uri.to_string(), target, SourceKind::Delimited);
        self.observed(&ctx, || {
            FileKind::Delimited.check(source_uri)?;
            let bytes = self.read_source(source_uri)?;
            let frame = loaded(source_uri, super::csv::load_csv_from_bytes(&bytes))?;
            self.persist(frame, target)
        })
    }

    /// Convert the first sheet of an `xlsx`/`xls` object. Any other extension fails with
    /// [`IngestionError::InvalidSourceType`].
    pub fn ingest_spreadsheet(&self, source_uri: &str, target: &TargetPath) -> IngestionResult<IngestionStats> {
        let ctx = self.context(source_uri.to_string(), target, SourceKind::Spreadsheet);
        self.observed(&ctx, || {
            FileKind::Spreadsheet.check(source_uri)?;
            let bytes = self.read_source(source_uri)?;
            let frame = loaded(source_uri, load_spreadsheet(&bytes))?;
            self.persist(frame, target)
        })
    }

    /// Run `query` read-only and convert its result set.
    ///
    /// The connection is opened right before the query and closed before the Parquet object is
    /// encoded, on every exit path. A result set without columns is a
    /// [`IngestionError::QueryExecution`] error; one with columns but no rows is written as a
    /// schema-only object.
    pub fn ingest_query(
        &self,
        query: &str,
        connection_string: &str,
        target: &TargetPath,
        credentials: Option<&Credentials>,
    ) -> IngestionResult<IngestionStats> {
        let description = format!("query on {}", redact_connection_string(connection_string));
        let ctx = self.context(description, target, SourceKind::Query);
        self.observed(&ctx, || {
            let result = {
                let mut conn = ScopedConnection::open(self.connector.as_ref(), connection_string, credentials)?;
                conn.query_read_only(query)?
            };
            if result.columns.is_empty() {
                return Err(IngestionError::query("query returned no columns", None));
            }
            self.persist(result.into_frame(), target)
        })
    }

    fn context(&self, source: String, target: &TargetPath, kind: SourceKind) -> IngestionContext {
        IngestionContext {
            source,
            target: target.to_string(),
            kind,
        }
    }

    fn observed<F>(&self, ctx: &IngestionContext, job: F) -> IngestionResult<IngestionStats>
    where
        F: FnOnce() -> IngestionResult<IngestionStats>,
    {
        self.observer.on_job_started(ctx);
        let result = job();
        match &result {
            Ok(stats) => self.observer.on_success(ctx, *stats),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                self.observer.on_failure(ctx, sev, e);
                if sev >= self.alert_at_or_above {
                    self.observer.on_alert(ctx, sev, e);
                }
            }
        }
        result
    }

    fn read_source(&self, source_uri: &str) -> IngestionResult<Vec<u8>> {
        let uri = ObjectUri::parse(source_uri).map_err(|e| IngestionError::source_read(source_uri, e))?;
        self.store
            .get_object(&uri)
            .map_err(|e| IngestionError::source_read(source_uri, e))
    }

    fn persist(&self, frame: TabularFrame, target: &TargetPath) -> IngestionResult<IngestionStats> {
        let normalized = normalize(frame);
        let bytes = write_parquet(&normalized, &self.parquet)
            .map_err(|e| IngestionError::serialization(target.to_string(), e))?;
        let stats = IngestionStats {
            rows: normalized.row_count(),
            columns: normalized.column_count(),
            bytes: bytes.len(),
        };
        // TargetPath is lowercase by construction.
        self.store
            .put_object(target.uri(), bytes)
            .map_err(|e| IngestionError::serialization(target.to_string(), e))?;
        Ok(stats)
    }
}

impl fmt::Debug for IngestionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionEngine")
            .field("parquet", &self.parquet)
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

/// Attach the source to a loader error and reject frames without columns.
fn loaded(source_uri: &str, frame: Result<TabularFrame, BoxError>) -> IngestionResult<TabularFrame> {
    let frame = frame.map_err(|e| IngestionError::source_read(source_uri, e))?;
    if frame.column_count() == 0 {
        return Err(IngestionError::source_read(source_uri, "source has no columns"));
    }
    Ok(frame)
}

#[cfg(feature = "excel")]
fn load_spreadsheet(bytes: &[u8]) -> Result<TabularFrame, BoxError> {
    super::excel::load_first_sheet_from_bytes(bytes)
}

#[cfg(not(feature = "excel"))]
fn load_spreadsheet(_bytes: &[u8]) -> Result<TabularFrame, BoxError> {
    Err("spreadsheet ingestion not enabled (enable cargo feature 'excel')".into())
}
