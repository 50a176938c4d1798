use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::paths::ObjectUri;

use super::{is_direct_child, ObjectStore, StorageError};

/// In-memory [`ObjectStore`] keyed by `(bucket, key)`.
///
/// The URI scheme is ignored.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, bypassing the URI form.
    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        self.lock()
            .insert((bucket.to_string(), key.to_string()), bytes.into());
    }

    /// Fetch an object directly.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// All `(bucket, key)` pairs currently stored.
    pub fn keys(&self) -> Vec<(String, String)> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for MemoryObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryObjectStore")
            .field("objects_len", &self.lock().len())
            .finish()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lock()
            .keys()
            .filter(|(b, key)| b == bucket && is_direct_child(key, prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn get_object(&self, uri: &ObjectUri) -> Result<Vec<u8>, StorageError> {
        self.object(&uri.bucket, &uri.key)
            .ok_or_else(|| StorageError::NotFound {
                uri: uri.to_string(),
            })
    }

    fn put_object(&self, uri: &ObjectUri, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.insert(&uri.bucket, &uri.key, bytes);
        Ok(())
    }
}
