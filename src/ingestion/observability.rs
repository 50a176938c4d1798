use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::IngestionError;

use super::source::SourceKind;

/// Severity of a log record. Also used for alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Diagnostic detail (skipped objects, plan details).
    Debug,
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

impl IngestionSeverity {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Severity used when reporting `error`: I/O-rooted failures are critical.
    pub fn for_error(error: &IngestionError) -> Self {
        if error.is_io_rooted() {
            Self::Critical
        } else {
            Self::Error
        }
    }
}

impl fmt::Display for IngestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestionSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "unknown log level '{other}' (expected debug/info/warning/error/critical)"
            )),
        }
    }
}

/// Context about one ingestion job.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Source, as a URI for files or a redacted connection description for queries.
    pub source: String,
    /// Target object URI.
    pub target: String,
    /// Kind of source being ingested.
    pub kind: SourceKind,
}

/// Stats reported on a successful job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of rows written.
    pub rows: usize,
    /// Number of columns written.
    pub columns: usize,
    /// Size of the Parquet object in bytes.
    pub bytes: usize,
}

/// Observer interface for ingestion events.
///
/// This is the crate's logging handle: it is constructed once (see
/// [`crate::logging::build_observer`]) and passed to the engine and the handler.
pub trait IngestionObserver: Send + Sync {
    /// Free-form log record.
    fn on_message(&self, _severity: IngestionSeverity, _message: &str) {}

    /// Called before a job starts loading its source.
    fn on_job_started(&self, _ctx: &IngestionContext) {}

    /// Called when a listed object is skipped because its extension is not ingestible.
    fn on_skipped(&self, _object: &str) {}

    /// Called when a job succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a job fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a job failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl IngestionObserver for NoopObserver {}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }

    /// Number of wrapped observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if no observers are wrapped.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_message(&self, severity: IngestionSeverity, message: &str) {
        for o in &self.observers {
            o.on_message(severity, message);
        }
    }

    fn on_job_started(&self, ctx: &IngestionContext) {
        for o in &self.observers {
            o.on_job_started(ctx);
        }
    }

    fn on_skipped(&self, object: &str) {
        for o in &self.observers {
            o.on_skipped(object);
        }
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Drops records below a minimum severity before forwarding them.
///
/// Job starts and successes count as `Info`, skipped objects as `Debug`.
pub struct LevelFilter {
    inner: Arc<dyn IngestionObserver>,
    min: IngestionSeverity,
}

impl LevelFilter {
    /// Wrap `inner`, forwarding only records at or above `min`.
    pub fn new(inner: Arc<dyn IngestionObserver>, min: IngestionSeverity) -> Self {
        Self { inner, min }
    }

    fn enabled(&self, severity: IngestionSeverity) -> bool {
        severity >= self.min
    }
}

impl fmt::Debug for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelFilter").field("min", &self.min).finish()
    }
}

impl IngestionObserver for LevelFilter {
    fn on_message(&self, severity: IngestionSeverity, message: &str) {
        if self.enabled(severity) {
            self.inner.on_message(severity, message);
        }
    }

    fn on_job_started(&self, ctx: &IngestionContext) {
        if self.enabled(IngestionSeverity::Info) {
            self.inner.on_job_started(ctx);
        }
    }

    fn on_skipped(&self, object: &str) {
        if self.enabled(IngestionSeverity::Debug) {
            self.inner.on_skipped(object);
        }
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        if self.enabled(IngestionSeverity::Info) {
            self.inner.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        if self.enabled(severity) {
            self.inner.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        if self.enabled(severity) {
            self.inner.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards records to `tracing`, under the target `datalake_ingest`.
///
/// Whatever subscriber the process installs acts as the log collector.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    name: String,
}

impl TracingObserver {
    /// Create an observer whose records carry `name` as the `logger` field.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("datalake_ingest")
    }
}

impl IngestionObserver for TracingObserver {
    fn on_message(&self, severity: IngestionSeverity, message: &str) {
        let logger = self.name.as_str();
        match severity {
            IngestionSeverity::Debug => tracing::debug!(logger, "{message}"),
            IngestionSeverity::Info => tracing::info!(logger, "{message}"),
            IngestionSeverity::Warning => tracing::warn!(logger, "{message}"),
            IngestionSeverity::Error | IngestionSeverity::Critical => {
                tracing::error!(logger, severity = severity.as_str(), "{message}")
            }
        }
    }

    fn on_job_started(&self, ctx: &IngestionContext) {
        tracing::info!(
            logger = self.name.as_str(),
            kind = ?ctx.kind,
            source = %ctx.source,
            target = %ctx.target,
            "ingestion started"
        );
    }

    fn on_skipped(&self, object: &str) {
        tracing::debug!(logger = self.name.as_str(), object, "skipping object with unsupported extension");
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            logger = self.name.as_str(),
            kind = ?ctx.kind,
            source = %ctx.source,
            target = %ctx.target,
            rows = stats.rows,
            columns = stats.columns,
            bytes = stats.bytes,
            "ingestion finished"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            logger = self.name.as_str(),
            severity = severity.as_str(),
            kind = ?ctx.kind,
            source = %ctx.source,
            target = %ctx.target,
            error = %error,
            "ingestion failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            logger = self.name.as_str(),
            alert = true,
            severity = severity.as_str(),
            source = %ctx.source,
            target = %ctx.target,
            error = %error,
            "ingestion alert"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<(IngestionSeverity, String)>>,
        skipped: Mutex<Vec<String>>,
    }

    impl IngestionObserver for Recorder {
        fn on_message(&self, severity: IngestionSeverity, message: &str) {
            self.messages.lock().unwrap().push((severity, message.to_string()));
        }

        fn on_skipped(&self, object: &str) {
            self.skipped.lock().unwrap().push(object.to_string());
        }
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<IngestionSeverity>(), Ok(IngestionSeverity::Debug));
        assert_eq!("Warning".parse::<IngestionSeverity>(), Ok(IngestionSeverity::Warning));
        assert_eq!("warn".parse::<IngestionSeverity>(), Ok(IngestionSeverity::Warning));
        assert!("verbose".parse::<IngestionSeverity>().is_err());
    }

    #[test]
    fn level_filter_drops_records_below_threshold() {
        let rec = Arc::new(Recorder::default());
        let filter = LevelFilter::new(rec.clone(), IngestionSeverity::Warning);

        filter.on_message(IngestionSeverity::Info, "hidden");
        filter.on_message(IngestionSeverity::Error, "shown");
        filter.on_skipped("raw/readme.txt");

        let messages = rec.messages.lock().unwrap().clone();
        assert_eq!(messages, vec![(IngestionSeverity::Error, "shown".to_string())]);
        assert!(rec.skipped.lock().unwrap().is_empty());
    }

    #[test]
    fn composite_fans_out() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let sinks: Vec<Arc<dyn IngestionObserver>> = vec![a.clone(), b.clone()];
        let composite = CompositeObserver::new(sinks);
        composite.on_skipped("x.txt");
        assert_eq!(a.skipped.lock().unwrap().len(), 1);
        assert_eq!(b.skipped.lock().unwrap().len(), 1);
    }
}
