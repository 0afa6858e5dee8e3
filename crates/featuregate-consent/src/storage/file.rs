//! JSON-file key-value store.
//!
//! All entries live in a single JSON object file. Writes are atomic (write to
//! `.tmp`, then rename) so an interrupted write never leaves a half-written
//! file behind. A file that no longer parses is moved aside to `.corrupt` on
//! the next write so the store can recover.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use super::traits::KeyValueStore;
use crate::error::{StorageError, StorageResult};

/// Key-value store persisted as one JSON file.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    io: Mutex<()>,
}

impl JsonFileKeyValueStore {
    /// Create a store backed by the file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> StorageResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries to start a read-modify-write cycle from. Unparseable contents
    /// are set aside and replaced by an empty map.
    async fn entries_for_write(&self) -> StorageResult<BTreeMap<String, String>> {
        match self.read_entries().await {
            Err(StorageError::Serialization(reason)) => {
                let corrupt_path = self.path.with_extension("corrupt");
                warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Store file is corrupt; starting from an empty file"
                );
                if let Err(e) = tokio::fs::rename(&self.path, &corrupt_path).await {
                    warn!(
                        path = %corrupt_path.display(),
                        error = %e,
                        "Could not keep corrupt store file"
                    );
                }
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(entries)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.io.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.io.lock().await;
        let mut entries = self.entries_for_write().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.io.lock().await;
        let mut entries = self.entries_for_write().await?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.write_entries(&entries).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKeyValueStore::new(dir.path().join("state.json"));
        assert!(store.get("userConsent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileKeyValueStore::new(&path);
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        assert!(store.remove("a").await.unwrap());

        let reopened = JsonFileKeyValueStore::new(&path);
        assert!(reopened.get("a").await.unwrap().is_none());
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("2"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn garbage_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileKeyValueStore::new(&path);
        let err = store.get("a").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn write_over_garbage_file_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileKeyValueStore::new(&path);
        store.set("a", "1").await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        let kept = std::fs::read_to_string(path.with_extension("corrupt")).unwrap();
        assert_eq!(kept, "not json");
    }

    #[tokio::test]
    async fn remove_over_garbage_file_reports_nothing_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{").unwrap();

        let store = JsonFileKeyValueStore::new(&path);
        assert!(!store.remove("a").await.unwrap());
        assert!(store.get("a").await.unwrap().is_none());
    }
}
