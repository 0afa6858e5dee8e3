//! # featuregate-consent
//!
//! The user's consent decision, persisted through a pluggable
//! [`KeyValueStore`].
//!
//! - [`ConsentStore`] owns the decision and the consent banner state
//! - writes go through one background writer, in call order
//! - backends: [`InMemoryKeyValueStore`] and [`JsonFileKeyValueStore`]
//!
//! Persistence failures never reach callers. A failed read yields the
//! default decision; a failed write is logged and the in-memory value stands.

#![deny(unsafe_code)]

pub mod error;
pub mod storage;
pub mod store;
mod writer;

pub use error::{ConsentError, StorageError, StorageResult};
pub use storage::{InMemoryKeyValueStore, JsonFileKeyValueStore, KeyValueStore};
pub use store::{
    ConsentStore, ConsentStoreConfig, DEFAULT_BANNER_DISMISSED_KEY, DEFAULT_CONSENT_KEY,
};
pub use writer::WriterStats;

pub use featuregate_types::{ConsentCategory, ConsentDecision};
