// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Object storage access.
//!
//! The dashboard talks to storage through [`ObjectStore`]. The bundled
//! [`LocalObjectStore`] maps each bucket to a directory, which is what the
//! desktop build and the tests run against.
//!
//! The free functions on top of the trait carry the pipeline's tolerance
//! rules: a missing or forbidden object reads as "absent", anything else
//! is an error for the caller.

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Bucket/key object storage.
pub trait ObjectStore: Send + Sync {
    /// Succeeds when the object exists and is readable.
    fn head(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Read the whole object body.
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite the whole object.
    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StorageError>;

    /// Immediate child prefixes of `prefix`, without the trailing `/`.
    ///
    /// `list_prefixes(b, "")` returns top-level names; `list_prefixes(b, "a/")`
    /// returns the names directly under `a/`.
    fn list_prefixes(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// URL that grants read access to the object for `ttl_secs` seconds.
    fn signed_read_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, StorageError>;
}

/// Whether an object exists. Not-found and forbidden both read as `false`.
pub fn object_exists(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<bool, StorageError> {
    if bucket.is_empty() || key.is_empty() {
        return Ok(false);
    }
    match store.head(bucket, key) {
        Ok(()) => Ok(true),
        Err(e) if e.is_absent() => {
            if matches!(e, StorageError::AccessDenied { .. }) {
                log::warn!("objectExists access denied: {}/{}", bucket, key);
            }
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Read and parse a JSON object. Not-found and forbidden read as `None`.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Option<T>, StorageError> {
    if bucket.is_empty() || key.is_empty() {
        return Ok(None);
    }
    let body = match store.get(bucket, key) {
        Ok(body) => body,
        Err(e) if e.is_absent() => {
            if matches!(e, StorageError::AccessDenied { .. }) {
                log::warn!("readJson access denied: {}/{}", bucket, key);
            }
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if body.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Overwrite an object with pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(bucket, key, &body)
}

/// Directory-per-bucket store rooted at a local path.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Join path parts under the root, refusing anything that could escape it.
    fn checked_path(&self, parts: &[&str]) -> Result<PathBuf, StorageError> {
        let mut path = self.root.clone();
        for part in parts {
            let relative = Path::new(part);
            if part.is_empty()
                || relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(StorageError::InvalidKey(parts.join("/")));
            }
            path.push(relative);
        }
        Ok(path)
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        self.checked_path(&[bucket, key])
    }

    fn map_io(err: std::io::Error, bucket: &str, key: &str) -> StorageError {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StorageError::Io(err),
        }
    }
}

impl ObjectStore for LocalObjectStore {
    fn head(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        let meta = std::fs::metadata(&path).map_err(|e| Self::map_io(e, bucket, key))?;
        if meta.is_file() {
            Ok(())
        } else {
            Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        }
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        std::fs::read(&path).map_err(|e| Self::map_io(e, bucket, key))
    }

    fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Self::map_io(e, bucket, key))?;
        }
        std::fs::write(&path, body).map_err(|e| Self::map_io(e, bucket, key))
    }

    fn list_prefixes(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let trimmed = prefix.trim_end_matches('/');
        let dir = if trimmed.is_empty() {
            self.checked_path(&[bucket])?
        } else {
            self.object_path(bucket, trimmed)?
        };
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::map_io(e, bucket, prefix)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn signed_read_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, StorageError> {
        let path = self.object_path(bucket, key)?;
        let absolute = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        let expires = chrono::Utc::now().timestamp() + ttl_secs as i64;
        Ok(format!("file://{}?expires={}", absolute.display(), expires))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, LocalObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_write_then_read_json() {
        let (_dir, store) = store();
        write_json(&store, "gt", "org-a/projects/p1/x.json", &json!({"a": 1})).unwrap();
        let value: Option<serde_json::Value> =
            read_json(&store, "gt", "org-a/projects/p1/x.json").unwrap();
        assert_eq!(value, Some(json!({"a": 1})));
    }

    #[test]
    fn test_missing_objects_are_absent() {
        let (_dir, store) = store();
        assert!(!object_exists(&store, "gt", "nothing.json").unwrap());
        let value: Option<serde_json::Value> = read_json(&store, "gt", "nothing.json").unwrap();
        assert!(value.is_none());
        assert!(!object_exists(&store, "", "nothing.json").unwrap());
    }

    #[test]
    fn test_corrupt_json_propagates() {
        let (_dir, store) = store();
        store.put("gt", "bad.json", b"{not json").unwrap();
        let result: Result<Option<serde_json::Value>, _> = read_json(&store, "gt", "bad.json");
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[test]
    fn test_keys_cannot_escape_root() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("gt", "../secret"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("gt", "/etc/passwd", b""),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_list_prefixes() {
        let (_dir, store) = store();
        store.put("orthos", "org-a/projects/p1/odm_orthophoto.tif", b"x").unwrap();
        store.put("orthos", "org-a/projects/p2/odm_orthophoto.tif", b"x").unwrap();
        store.put("orthos", "orgb/readme.txt", b"x").unwrap();

        assert_eq!(store.list_prefixes("orthos", "").unwrap(), vec!["org-a", "orgb"]);
        assert_eq!(
            store.list_prefixes("orthos", "org-a/projects/").unwrap(),
            vec!["p1", "p2"]
        );
        assert!(store.list_prefixes("orthos", "nobody/projects/").unwrap().is_empty());
        assert!(store.list_prefixes("missing-bucket", "").unwrap().is_empty());
    }

    #[test]
    fn test_signed_url_points_at_object() {
        let (_dir, store) = store();
        store.put("orthos", "org-a/img.jpg", b"x").unwrap();
        let url = store.signed_read_url("orthos", "org-a/img.jpg", 60).unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("org-a/img.jpg?expires="));
    }
}
