//! Blob storage collaborators.
//!
//! The engine and router only see the [`ObjectStore`] trait. Two implementations ship with the
//! crate:
//!
//! - [`LocalObjectStore`]: buckets are directories under a root directory
//! - [`MemoryObjectStore`]: an in-process map, handy for tests and dry runs

mod local;
mod memory;

use thiserror::Error;

use crate::paths::ObjectUri;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

/// Errors raised by an [`ObjectStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object or bucket does not exist.
    #[error("object not found: {uri}")]
    NotFound { uri: String },

    /// The bucket or key cannot be mapped onto the store.
    #[error("invalid object address '{uri}': {message}")]
    InvalidAddress { uri: String, message: String },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability interface for blob storage.
pub trait ObjectStore: Send + Sync {
    /// List object keys in `bucket` that start with `prefix` and contain no further `/` after it.
    ///
    /// Nested "folders" are not descended into. Keys are returned in lexicographic order.
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Read an object's bytes.
    fn get_object(&self, uri: &ObjectUri) -> Result<Vec<u8>, StorageError>;

    /// Write (create or overwrite) an object.
    fn put_object(&self, uri: &ObjectUri, bytes: Vec<u8>) -> Result<(), StorageError>;
}

/// Returns `true` if `key` sits directly under `prefix` (flat listing with a `/` delimiter).
pub(crate) fn is_direct_child(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}
