//! Object naming: extension handling, bucket/folder locations and target path derivation.

use std::fmt;

use thiserror::Error;

use crate::error::{IngestionError, IngestionResult};

/// Extension of the columnar output format.
pub const PARQUET_EXTENSION: &str = "parquet";

/// Replace the source extension in `source_object_name` with `target_extension` and lowercase
/// the result.
///
/// The match is a literal replace of the first `.<source_extension>` found in the lowercased
/// name, not a suffix check: `a.csv.bak.csv` becomes `a.parquet.bak.csv`. A name that does not
/// contain the extension is returned lowercased but otherwise unchanged.
///
/// ```
/// use datalake_ingest::paths::derive_target_object_name;
///
/// assert_eq!(
///     derive_target_object_name("orders_2024.CSV", "csv", "parquet"),
///     "orders_2024.parquet"
/// );
/// ```
pub fn derive_target_object_name(
    source_object_name: &str,
    source_extension: &str,
    target_extension: &str,
) -> String {
    let lowered = source_object_name.to_lowercase();
    let from = format!(".{}", source_extension.to_lowercase());
    let to = format!(".{}", target_extension.to_lowercase());
    lowered.replacen(&from, &to, 1)
}

/// Text after the last `.` of the last path segment, if any.
pub fn extension_of(name: &str) -> Option<&str> {
    let base = object_basename(name);
    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Text after the last `/`.
pub fn object_basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// A `<bucket>[/<folder>]` location as supplied in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Bucket name.
    pub bucket: String,
    /// Folder below the bucket, without leading or trailing slashes. Empty for the bucket root.
    pub folder: String,
}

impl Location {
    /// Split a location at its first `/`.
    pub fn parse(raw: &str) -> IngestionResult<Self> {
        let raw = raw.trim();
        let (bucket, folder) = match raw.split_once('/') {
            Some((bucket, folder)) => (bucket, folder.trim_matches('/')),
            None => (raw, ""),
        };
        if bucket.is_empty() {
            return Err(IngestionError::parameter(format!(
                "location '{raw}' has no bucket name"
            )));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            folder: folder.to_string(),
        })
    }

    /// Listing prefix for the folder: `folder/`, or empty for the bucket root.
    pub fn listing_prefix(&self) -> String {
        if self.folder.is_empty() {
            String::new()
        } else {
            format!("{}/", self.folder)
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.folder)
    }
}

/// A `scheme://bucket/key` object address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectUri {
    /// URI scheme without `://` (e.g. `gs`).
    pub scheme: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key inside the bucket.
    pub key: String,
}

impl ObjectUri {
    /// Create a URI from its parts.
    pub fn new(scheme: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `scheme://bucket/key`.
    ///
    /// Everything after the bucket is the key, byte for byte: no percent-decoding, and `?` or `#`
    /// are ordinary key characters.
    pub fn parse(uri: &str) -> Result<Self, InvalidObjectUri> {
        let invalid = |reason| InvalidObjectUri {
            uri: uri.to_string(),
            reason,
        };
        let (scheme, rest) = uri.split_once("://").ok_or_else(|| invalid("has no scheme"))?;
        let (bucket, key) = rest.split_once('/').ok_or_else(|| invalid("has no key"))?;
        if scheme.is_empty() || bucket.is_empty() || key.is_empty() {
            return Err(invalid("must look like scheme://bucket/key"));
        }
        Ok(Self::new(scheme, bucket, key))
    }
}

/// An object address that does not look like `scheme://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("object uri '{uri}' {reason}")]
pub struct InvalidObjectUri {
    /// The rejected input.
    pub uri: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

/// Fully qualified, lowercase output location ending in `.parquet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    uri: ObjectUri,
}

impl TargetPath {
    /// Join `scheme://bucket/folder/object_name`, skipping an empty folder, lowercase the whole
    /// path, and append the Parquet extension if the name does not already end in it.
    pub fn new(scheme: &str, bucket: &str, folder: &str, object_name: &str) -> IngestionResult<Self> {
        let mut name = object_name.trim_matches('/').to_lowercase();
        if name.is_empty() {
            return Err(IngestionError::parameter("target object name is empty"));
        }
        let suffix = format!(".{PARQUET_EXTENSION}");
        if !name.ends_with(&suffix) {
            name.push_str(&suffix);
        }

        let folder = folder.trim_matches('/').to_lowercase();
        let key = if folder.is_empty() {
            name
        } else {
            format!("{folder}/{name}")
        };
        if bucket.is_empty() {
            return Err(IngestionError::parameter("target bucket is empty"));
        }

        Ok(Self {
            uri: ObjectUri::new(scheme.to_lowercase(), bucket.to_lowercase(), key),
        })
    }

    /// Build a target for `object_name` under `location`.
    pub fn in_location(scheme: &str, location: &Location, object_name: &str) -> IngestionResult<Self> {
        Self::new(scheme, &location.bucket, &location.folder, object_name)
    }

    /// The object address.
    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uri.fmt(f)
    }
}
