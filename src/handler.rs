//! Invocation entry point: request in, response message out.

use std::fmt;
use std::sync::Arc;

use crate::config::HandlerConfig;
use crate::db::{default_connector, DatabaseConnector};
use crate::error::IngestionResult;
use crate::ingestion::{IngestionEngine, IngestionObserver, IngestionSeverity, ParquetWriteOptions};
use crate::logging::build_observer;
use crate::router::{IngestRequest, Job, Router};
use crate::storage::{LocalObjectStore, ObjectStore};

/// Runs one ingestion request end to end.
///
/// Jobs run one after another; the first failure aborts the batch and is returned as-is.
/// Objects written by earlier jobs are left in place.
pub struct Handler {
    router: Router,
    engine: IngestionEngine,
    observer: Arc<dyn IngestionObserver>,
}

impl Handler {
    /// Assemble a handler from explicit collaborators.
    pub fn new(
        config: &HandlerConfig,
        store: Arc<dyn ObjectStore>,
        connector: Arc<dyn DatabaseConnector>,
        observer: Arc<dyn IngestionObserver>,
    ) -> Self {
        let router = Router::new(Arc::clone(&store), config.scheme.clone()).with_observer(Arc::clone(&observer));
        let engine = IngestionEngine::new(store, connector)
            .with_observer(Arc::clone(&observer))
            .with_parquet_options(ParquetWriteOptions {
                compression: config.compression,
            })
            .with_alert_threshold(config.alert_at_or_above);
        Self {
            router,
            engine,
            observer,
        }
    }

    /// Handler over a [`LocalObjectStore`] rooted at `config.storage_root`, the compiled-in
    /// database connector and the observer described by `config.log`.
    pub fn from_config(config: &HandlerConfig) -> Self {
        Self::new(
            config,
            Arc::new(LocalObjectStore::new(&config.storage_root)),
            default_connector(),
            build_observer(&config.log),
        )
    }

    /// Validate, plan and run one request.
    ///
    /// Returns `"Parquet file(s) uploaded to <target_bucket>/<target_folder>"` on success.
    pub fn handle(&self, content_type: &str, body: &[u8]) -> IngestionResult<String> {
        let request = IngestRequest::parse(content_type, body).inspect_err(|e| {
            self.observer.on_message(IngestionSeverity::Error, &e.to_string());
        })?;
        self.observer
            .on_message(IngestionSeverity::Info, "Parameters acquired, resuming...");
        self.run(&request)
    }

    /// Plan and run an already-validated request.
    pub fn run(&self, request: &IngestRequest) -> IngestionResult<String> {
        let jobs = self.router.plan(request)?;
        self.observer.on_message(
            IngestionSeverity::Debug,
            &format!("planned {} job(s) for {}", jobs.len(), request.target()),
        );

        for Job { source, target } in &jobs {
            self.engine.ingest(source, target)?;
        }

        self.observer.on_message(
            IngestionSeverity::Info,
            &format!("Converted {} file(s) to parquet", jobs.len()),
        );
        Ok(format!("Parquet file(s) uploaded to {}", request.target()))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("router", &self.router)
            .field("engine", &self.engine)
            .finish()
    }
}
