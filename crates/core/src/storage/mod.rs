//! Durable local key-value storage.
//!
//! The favorites set lives under a single key; the storage layer only
//! knows about opaque string values.

mod sqlite;

pub use sqlite::SqliteStorage;

use thiserror::Error;

/// Errors from the local storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be opened or queried.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Storage is not available (e.g. read-only or locked).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Trait for single-key local storage backends.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
