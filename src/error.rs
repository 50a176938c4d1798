use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause carried by the load/query/write variants of [`IngestionError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by the router, the engine and the handler.
///
/// None of these are retried internally; every variant terminates the invocation.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Malformed or incomplete request. Raised before any I/O happens.
    #[error("parameter validation failed: {message}")]
    ParameterValidation { message: String },

    /// The source's extension does not belong to the family the operation accepts.
    #[error("invalid source type '{extension}' for '{uri}' (expected one of {expected:?})")]
    InvalidSourceType {
        uri: String,
        extension: String,
        expected: &'static [&'static str],
    },

    /// The source could not be listed, fetched or parsed.
    #[error("failed to read source '{uri}': {source}")]
    SourceRead {
        uri: String,
        #[source]
        source: BoxError,
    },

    /// Connecting to the database or running the query failed.
    #[error("query execution failed: {message}")]
    QueryExecution {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Encoding the Parquet object or writing it to storage failed.
    #[error("failed to write '{target}': {source}")]
    Serialization {
        target: String,
        #[source]
        source: BoxError,
    },
}

impl IngestionError {
    pub(crate) fn parameter(message: impl Into<String>) -> Self {
        Self::ParameterValidation {
            message: message.into(),
        }
    }

    pub(crate) fn source_read(uri: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::SourceRead {
            uri: uri.into(),
            source: source.into(),
        }
    }

    pub(crate) fn query(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::QueryExecution {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn serialization(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Serialization {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if an I/O error appears anywhere in the cause chain.
    pub fn is_io_rooted(&self) -> bool {
        let mut cur: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = cur {
            if err.is::<std::io::Error>() {
                return true;
            }
            cur = err.source();
        }
        false
    }
}
