//! Request parsing and job planning.
//!
//! A request is either a `file` request (convert every ingestible object directly under a source
//! folder) or a `db` request (run one query). [`Router::plan`] turns it into the ordered list of
//! [`Job`]s the engine runs.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::db::Credentials;
use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{FileKind, IngestionObserver, IngestionSeverity, NoopObserver, SourceDescriptor};
use crate::paths::{derive_target_object_name, extension_of, object_basename, Location, ObjectUri, TargetPath, PARQUET_EXTENSION};
use crate::storage::ObjectStore;

/// Object name used when no table name can be extracted from a query.
pub const FALLBACK_TABLE_NAME: &str = "query_result";

/// A validated ingestion request.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestRequest {
    /// Convert the files under `source` into `target`.
    File { source: Location, target: Location },
    /// Convert the result of `query` into `target`.
    Db {
        query: String,
        db_url: String,
        target: Location,
        credentials: Option<Credentials>,
    },
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    source_loc: Option<String>,
    target_loc: Option<String>,
    query: Option<String>,
    db_url: Option<String>,
    credentials: Option<serde_json::Value>,
}

impl IngestRequest {
    /// Validate the content type and parse the JSON body.
    pub fn parse(content_type: &str, body: &[u8]) -> IngestionResult<Self> {
        if !is_json_content_type(content_type) {
            return Err(IngestionError::parameter(format!(
                "parameter content type unrecognized - {content_type}"
            )));
        }
        let raw: RawRequest = serde_json::from_slice(body)
            .map_err(|e| IngestionError::parameter(format!("request body is not a valid request object: {e}")))?;
        Self::from_raw(raw)
    }

    /// Parse an already-decoded JSON value.
    pub fn from_json(value: serde_json::Value) -> IngestionResult<Self> {
        let raw: RawRequest = serde_json::from_value(value)
            .map_err(|e| IngestionError::parameter(format!("request body is not a valid request object: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRequest) -> IngestionResult<Self> {
        let source_loc = non_empty(raw.source_loc);
        let target_loc = non_empty(raw.target_loc);
        let query = non_empty(raw.query);
        let db_url = non_empty(raw.db_url);

        if source_loc.is_some() && (query.is_some() || db_url.is_some()) {
            return Err(IngestionError::parameter(
                "request mixes file parameters (source_loc) with db parameters (query/db_url)",
            ));
        }

        match (source_loc, target_loc, query, db_url) {
            (Some(source), Some(target), None, None) => Ok(Self::File {
                source: Location::parse(&source)?,
                target: Location::parse(&target)?,
            }),
            (None, Some(target), Some(query), Some(db_url)) => Ok(Self::Db {
                query,
                db_url,
                target: Location::parse(&target)?,
                credentials: raw.credentials.filter(|c| !c.is_null()).map(Credentials),
            }),
            _ => Err(IngestionError::parameter(
                "expected either {source_loc, target_loc} for file ingestion or \
                 {query, db_url, target_loc[, credentials]} for db ingestion",
            )),
        }
    }

    /// Where the output goes.
    pub fn target(&self) -> &Location {
        match self {
            Self::File { target, .. } | Self::Db { target, .. } => target,
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Returns `true` for `application/json` and `application/*+json`, ignoring parameters and case.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Best-effort table name: the whitespace-delimited token after the first `from ` (ASCII
/// case-insensitive).
///
/// This is not a SQL parser. It returns an empty string when `from ` is absent (for example
/// `from\nTable`), and whatever token follows for subqueries such as `FROM (SELECT ...`.
pub fn extract_table_name(query: &str) -> &str {
    // ASCII lowercasing keeps byte offsets aligned with `query`.
    let lowered = query.to_ascii_lowercase();
    let Some(idx) = lowered.find("from ") else {
        return "";
    };
    query[idx + "from ".len()..]
        .split(char::is_whitespace)
        .next()
        .unwrap_or("")
}

/// One unit of work for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// What to read.
    pub source: SourceDescriptor,
    /// Where to write.
    pub target: TargetPath,
}

/// Resolves requests into jobs.
pub struct Router {
    store: Arc<dyn ObjectStore>,
    scheme: String,
    observer: Arc<dyn IngestionObserver>,
}

impl Router {
    /// Create a router listing objects through `store` and addressing them with `scheme`.
    pub fn new(store: Arc<dyn ObjectStore>, scheme: impl Into<String>) -> Self {
        Self {
            store,
            scheme: scheme.into(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach the logging handle.
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Resolve `request` into jobs, in execution order.
    pub fn plan(&self, request: &IngestRequest) -> IngestionResult<Vec<Job>> {
        match request {
            IngestRequest::File { source, target } => self.plan_files(source, target),
            IngestRequest::Db {
                query,
                db_url,
                target,
                credentials,
            } => Ok(vec![self.plan_query(query, db_url, target, credentials.clone())?]),
        }
    }

    fn plan_files(&self, source: &Location, target: &Location) -> IngestionResult<Vec<Job>> {
        let prefix = source.listing_prefix();
        let keys = self
            .store
            .list_objects(&source.bucket, &prefix)
            .map_err(|e| IngestionError::source_read(format!("{}://{}/{prefix}", self.scheme, source.bucket), e))?;

        let mut jobs = Vec::new();
        for key in keys {
            let ext = extension_of(&key).unwrap_or("");
            let Some(kind) = FileKind::from_extension(ext) else {
                self.observer.on_skipped(&key);
                continue;
            };
            let name = derive_target_object_name(object_basename(&key), ext, PARQUET_EXTENSION);
            let uri = ObjectUri::new(self.scheme.as_str(), source.bucket.as_str(), key.as_str());
            jobs.push(Job {
                source: SourceDescriptor::File {
                    uri: uri.to_string(),
                    kind,
                },
                target: TargetPath::in_location(&self.scheme, target, &name)?,
            });
        }
        Ok(jobs)
    }

    fn plan_query(
        &self,
        query: &str,
        db_url: &str,
        target: &Location,
        credentials: Option<Credentials>,
    ) -> IngestionResult<Job> {
        let table = extract_table_name(query);
        let object = if table.is_empty() {
            self.observer.on_message(
                IngestionSeverity::Warning,
                &format!("no table name found after 'from ' in query; writing {FALLBACK_TABLE_NAME}.{PARQUET_EXTENSION}"),
            );
            FALLBACK_TABLE_NAME
        } else {
            table
        };
        Ok(Job {
            source: SourceDescriptor::query(query, db_url, credentials),
            target: TargetPath::in_location(&self.scheme, target, object)?,
        })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("scheme", &self.scheme).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_after_from() {
        assert_eq!(extract_table_name("SELECT * FROM Orders WHERE id=1"), "Orders");
        assert_eq!(extract_table_name("select * from sales.orders"), "sales.orders");
    }

    #[test]
    fn table_name_heuristic_known_failures() {
        assert_eq!(extract_table_name("select a from\nCustomers"), "");
        assert_eq!(extract_table_name("select 1"), "");
        assert_eq!(extract_table_name("select * from (select 1) t"), "(select");
    }

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/vnd.api+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("application/x-www-form-urlencoded"));
    }
}
