use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::paths::ObjectUri;

use super::{is_direct_child, ObjectStore, StorageError};

/// [`ObjectStore`] backed by the local filesystem.
///
/// Each bucket is a directory directly under `root`; object keys are relative paths inside it.
/// The URI scheme is ignored, so `gs://lake/a.parquet` maps to `<root>/lake/a.parquet`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory holding the buckets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let invalid = |message: &str| StorageError::InvalidAddress {
            uri: format!("{bucket}/{key}"),
            message: message.to_string(),
        };

        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(invalid("bucket must be a single path segment"));
        }
        let rel = Path::new(key);
        if !rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(invalid("key must be a relative path without '..'"));
        }
        Ok(self.root.join(bucket).join(rel))
    }
}

impl ObjectStore for LocalObjectStore {
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let bucket_dir = self.object_path(bucket, "")?;
        if !bucket_dir.is_dir() {
            return Err(StorageError::NotFound {
                uri: bucket.to_string(),
            });
        }

        // Only the directory holding the prefix is scanned; the name filter below applies the rest.
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let dir = if dir_part.is_empty() {
            bucket_dir.clone()
        } else {
            self.object_path(bucket, dir_part)?
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => StorageError::Io(io),
                None => StorageError::InvalidAddress {
                    uri: dir.display().to_string(),
                    message: "filesystem loop while listing".to_string(),
                },
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&bucket_dir) else {
                continue;
            };
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if is_direct_child(&key, prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn get_object(&self, uri: &ObjectUri) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(&uri.bucket, &uri.key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound {
                uri: uri.to_string(),
            },
            _ => StorageError::Io(e),
        })
    }

    fn put_object(&self, uri: &ObjectUri, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.object_path(&uri.bucket, &uri.key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }
}
