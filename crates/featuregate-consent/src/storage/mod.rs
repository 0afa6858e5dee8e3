//! Key-value storage backends.
//!
//! The consent store persists through the [`KeyValueStore`] abstraction; the
//! transport behind it belongs to the host application.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonFileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use traits::KeyValueStore;
