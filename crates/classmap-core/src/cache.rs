//! Key/value cache backends.
//!
//! Values are opaque JSON snapshots: an [`IndexTables`](crate::IndexTables)
//! per source under `indexsource_<normalized base>`, and one
//! [`ResolverSnapshot`](crate::ResolverSnapshot) under `__ClassLoader__`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;

/// Key prefix for per-source index snapshots.
pub const INDEX_SOURCE_CACHE_PREFIX: &str = "indexsource_";

/// Key of the aggregate resolver snapshot.
pub const RESOLVER_CACHE_KEY: &str = "__ClassLoader__";

/// Errors from a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An untyped key/value store.
pub trait CacheBackend: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get_data(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_data(&self, key: &str, value: Value) -> Result<(), CacheError>;
}

/// In-process cache. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` has a stored value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl CacheBackend for MemoryCache {
    fn get_data(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_data(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Cache persisted as one JSON document per key under a directory.
///
/// Keys are percent-encoded into file names, so distinct keys never share a
/// file. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }
}

impl CacheBackend for FileCache {
    fn get_data(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        debug!(key, path = %path.display(), "cache hit");
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn set_data(&self, key: &str, value: Value) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.entry_path(key);
        let bytes = serde_json::to_vec_pretty(&value)?;
        std::fs::write(&path, bytes).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(key, path = %path.display(), "cache entry written");
        Ok(())
    }
}

/// A cache that never hits and discards writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl CacheBackend for NullCache {
    fn get_data(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        Ok(None)
    }

    fn set_data(&self, _key: &str, _value: Value) -> Result<(), CacheError> {
        Ok(())
    }
}
