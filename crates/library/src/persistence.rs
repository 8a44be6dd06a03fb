// FILE: crates/library/src/persistence.rs
//! Key-value persistence behind the library store
//!
//! The store keeps the whole collection as one serialized value under a
//! single key. [`FileStore`] maps each key to one JSON file and replaces it
//! atomically; [`MemoryStore`] keeps values in process.

use crate::error::{LibraryError, LibraryResult};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;

/// Durable string storage addressed by key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written
    async fn get(&self, key: &str) -> LibraryResult<Option<String>>;

    /// Stores a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> LibraryResult<()>;

    /// Deletes a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> LibraryResult<()>;
}

/// Maps an arbitrary key or id onto a safe file stem
///
/// Distinct keys always get distinct stems: bytes outside `[A-Za-z0-9.-]`,
/// `_` itself and a leading `.` are written as `_XX` hex escapes.
pub(crate) fn file_stem(key: &str) -> String {
    if key.is_empty() {
        return "_".to_string();
    }

    let mut stem = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric() || byte == b'-' || (byte == b'.' && i > 0);
        if plain {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the given key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> LibraryResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LibraryError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> LibraryResult<()> {
        let dir = self.dir.clone();
        let path = self.path_for(key);
        let value = value.to_owned();

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &value))
            .await
            .map_err(|e| LibraryError::Storage(format!("write task failed: {}", e)))?
    }

    async fn remove(&self, key: &str) -> LibraryResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LibraryError::Io(e)),
        }
    }
}

/// Writes through a temporary file in the target directory, then renames
fn write_atomic(dir: &Path, path: &Path, contents: &str) -> LibraryResult<()> {
    std::fs::create_dir_all(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| LibraryError::Io(e.error))?;

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// In-process store, for tests and throwaway libraries
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> LibraryResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> LibraryResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> LibraryResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_stem_sanitizes_key() {
        assert_eq!(file_stem("@HearLearn:library"), "_40HearLearn_3Alibrary");
        assert_eq!(file_stem("../../etc/passwd"), "_2E._2F.._2Fetc_2Fpasswd");
        assert_eq!(file_stem(".."), "_2E.");
        assert_eq!(file_stem(""), "_");
        assert_eq!(file_stem("abc-123"), "abc-123");
    }

    #[test]
    fn test_file_stem_keeps_ids_apart() {
        assert_ne!(file_stem("a/b"), file_stem("a_b"));
        assert_ne!(file_stem("a_2Fb"), file_stem("a/b"));
        assert_ne!(file_stem("a b"), file_stem("a_20b"));
        assert_eq!(file_stem("a_b"), "a_5Fb");
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() -> LibraryResult<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().join("nested"));

        assert_eq!(store.get("@HearLearn:library").await?, None);

        store.set("@HearLearn:library", "[]").await?;
        assert_eq!(store.get("@HearLearn:library").await?.as_deref(), Some("[]"));
        assert!(store.path_for("@HearLearn:library").exists());

        store.set("@HearLearn:library", "[1]").await?;
        assert_eq!(store.get("@HearLearn:library").await?.as_deref(), Some("[1]"));

        store.remove("@HearLearn:library").await?;
        assert_eq!(store.get("@HearLearn:library").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_remove_missing_is_ok() -> LibraryResult<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        store.remove("never-written").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_temp_files() -> LibraryResult<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path());
        store.set("library", "[]").await?;

        let entries: Vec<_> = std::fs::read_dir(temp.path())?.collect();
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store() -> LibraryResult<()> {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await?, None);
        store.set("k", "v").await?;
        assert_eq!(store.get("k").await?.as_deref(), Some("v"));
        store.remove("k").await?;
        store.remove("k").await?;
        assert_eq!(store.get("k").await?, None);
        Ok(())
    }
}
