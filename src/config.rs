//! Handler configuration.

use std::path::PathBuf;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{IngestionSeverity, ParquetCompression};
use crate::logging::LogConfig;

/// Environment variable: directory under which buckets live.
pub const ENV_STORAGE_ROOT: &str = "INGEST_STORAGE_ROOT";
/// Environment variable: URI scheme used for object addresses.
pub const ENV_SCHEME: &str = "INGEST_SCHEME";
/// Environment variable: minimum log level.
pub const ENV_LOG_LEVEL: &str = "INGEST_LOG_LEVEL";
/// Environment variable: also log to stderr (`1`/`true`/`yes`).
pub const ENV_LOG_STREAM: &str = "INGEST_LOG_STREAM";
/// Environment variable: append logs to this file.
pub const ENV_LOG_FILE: &str = "INGEST_LOG_FILE";
/// Environment variable: Parquet compression codec.
pub const ENV_COMPRESSION: &str = "INGEST_COMPRESSION";

/// Everything the handler needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// Directory under which each bucket is a subdirectory.
    pub storage_root: PathBuf,
    /// URI scheme for object addresses (`gs`, `s3`, ...).
    pub scheme: String,
    /// Codec for written Parquet objects.
    pub compression: ParquetCompression,
    /// Failures at or above this severity are also raised as alerts.
    pub alert_at_or_above: IngestionSeverity,
    /// Logger settings.
    pub log: LogConfig,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            scheme: "gs".to_string(),
            compression: ParquetCompression::default(),
            alert_at_or_above: IngestionSeverity::Critical,
            log: LogConfig::default(),
        }
    }
}

impl HandlerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> IngestionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IngestionResult<Self> {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(root) = get(ENV_STORAGE_ROOT) {
            cfg.storage_root = PathBuf::from(root);
        }
        if let Some(scheme) = get(ENV_SCHEME) {
            cfg.scheme = scheme.to_ascii_lowercase();
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            cfg.log.level = level
                .parse()
                .map_err(|e: String| IngestionError::parameter(format!("{ENV_LOG_LEVEL}: {e}")))?;
        }
        if let Some(stream) = get(ENV_LOG_STREAM) {
            cfg.log.include_stream = parse_flag(ENV_LOG_STREAM, &stream)?;
        }
        if let Some(file) = get(ENV_LOG_FILE) {
            cfg.log.log_file = Some(PathBuf::from(file));
        }
        if let Some(codec) = get(ENV_COMPRESSION) {
            cfg.compression = codec
                .parse()
                .map_err(|e: String| IngestionError::parameter(format!("{ENV_COMPRESSION}: {e}")))?;
        }
        Ok(cfg)
    }
}

fn parse_flag(key: &str, raw: &str) -> IngestionResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(IngestionError::parameter(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}
