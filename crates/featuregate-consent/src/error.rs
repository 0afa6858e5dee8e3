//! Error types for consent persistence.

use thiserror::Error;

/// Result type for key-value storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore) backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Errors from the consent store.
///
/// None of these reach gating decisions: read failures fall back to the
/// default decision and write failures are logged.
#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("failed to read consent under key {key}: {source}")]
    PersistenceReadFailure {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to write consent under key {key}: {source}")]
    PersistenceWriteFailure {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("persisted consent under key {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("consent persistence writer has shut down")]
    WriterClosed,
}
