//! Cache and metadata storage substrate.
//!
//! Assets persist their primary data and their progress metadata through a
//! key-value substrate keyed by path-like strings built from the asset name
//! and argument tuple (e.g. `bills/118/house/page-3.json`). The engine only
//! needs existence checks, read-as-text, and write-with-directory-creation;
//! anything richer belongs to the collaborator implementing the trait.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors surfaced by a cache store.
#[derive(Debug, Error, Diagnostic)]
pub enum StorageError {
    /// The entry does not exist.
    #[error("missing cache entry: {key}")]
    #[diagnostic(
        code(assetgraph::storage::missing),
        help("The asset's policy should have triggered creation before this read.")
    )]
    Missing { key: String },

    /// Underlying I/O failure.
    #[error("storage I/O failure for {key}")]
    #[diagnostic(code(assetgraph::storage::io))]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// File-or-equivalent key-value storage for cached asset data.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Whether an entry exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Read an entry as text. Missing entries are an error, not an empty
    /// string — callers check [`exists`](Self::exists) first when absence is
    /// expected.
    async fn read(&self, key: &str) -> Result<String, StorageError>;

    /// Write an entry, creating any missing parent directories (or the
    /// substrate's equivalent).
    async fn write(&self, key: &str, contents: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and single-process runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        self.entries
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::Missing {
                key: key.to_string(),
            })
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

/// Filesystem-backed store rooted at a directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn io_err(key: &str, source: std::io::Error) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl CacheStore for FsStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match tokio::fs::try_exists(self.path_for(key)).await {
            Ok(found) => Ok(found),
            Err(source) => Err(Self::io_err(key, source)),
        }
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(contents),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::Missing {
                    key: key.to_string(),
                })
            }
            Err(source) => Err(Self::io_err(key, source)),
        }
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            ensure_dir(key, parent).await?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| Self::io_err(key, source))
    }
}

async fn ensure_dir(key: &str, parent: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| StorageError::Io {
            key: key.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(!store.exists("a/b").await.unwrap());
        store.write("a/b", "payload").await.unwrap();
        assert!(store.exists("a/b").await.unwrap());
        assert_eq!(store.read("a/b").await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn memory_store_missing_read_is_error() {
        let store = MemoryStore::new();
        let err = store.read("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::Missing { .. }));
    }
}
