//! Storage trait definition.

use async_trait::async_trait;

use crate::error::StorageResult;

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Returns whether a value was present.
    async fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Check if a value exists under `key`.
    async fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
