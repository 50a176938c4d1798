//! Logging setup.
//!
//! [`build_observer`] builds the single [`IngestionObserver`] handle that the handler and
//! engine share; its records go to `tracing`. [`init_tracing`] installs the process-wide
//! subscriber that writes them out:
//!
//! - the collector layer appends plain lines to `log_file`, when one is configured
//! - the console layer writes to stderr, only when `include_stream` is set

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::ingestion::{IngestionObserver, IngestionSeverity, LevelFilter, TracingObserver};

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Logger name, attached to every record.
    pub name: String,
    /// Minimum severity that is emitted.
    pub level: IngestionSeverity,
    /// Also write records to stderr.
    pub include_stream: bool,
    /// Append records to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            level: IngestionSeverity::Info,
            include_stream: false,
            log_file: None,
        }
    }
}

/// Build the observer described by `config`. Everything below `config.level` is dropped.
pub fn build_observer(config: &LogConfig) -> Arc<dyn IngestionObserver> {
    Arc::new(LevelFilter::new(
        Arc::new(TracingObserver::new(config.name.clone())),
        config.level,
    ))
}

/// `tracing` filter directive for a severity.
pub fn filter_directive(level: IngestionSeverity) -> &'static str {
    match level {
        IngestionSeverity::Debug => "debug",
        IngestionSeverity::Info => "info",
        IngestionSeverity::Warning => "warn",
        IngestionSeverity::Error | IngestionSeverity::Critical => "error",
    }
}

/// Build the subscriber for `config` without installing it.
///
/// `console` is the writer of the stream layer, which only exists when `include_stream` is set.
/// Fails if `log_file` cannot be opened for appending.
pub fn build_subscriber<W>(
    config: &LogConfig,
    filter: EnvFilter,
    console: W,
) -> io::Result<impl Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let collector = match &config.log_file {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };
    let stream = config
        .include_stream
        .then(|| tracing_subscriber::fmt::layer().with_writer(console).with_target(false));

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(collector)
        .with(stream))
}

/// Install the subscriber for `config` process-wide. `RUST_LOG` wins over `config.level` when
/// set.
///
/// Returns `Ok(false)` if a global subscriber was already installed.
pub fn init_tracing(config: &LogConfig) -> io::Result<bool> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(config.level)));
    let subscriber = build_subscriber(config, filter, io::stderr)?;
    Ok(subscriber.try_init().is_ok())
}
