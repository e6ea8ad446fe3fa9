//! User-curated favorites, mirrored to local storage.
//!
//! There is exactly one [`FavoritesStore`] per session. Every toggle path
//! (result grid, favorites list) goes through the same [`SharedFavorites`]
//! handle, and the match orchestrator reads from it too.

mod store;

pub use store::{FavoritesStore, ToggleOutcome};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::storage::StorageError;

/// Shared handle to the session's favorites.
pub type SharedFavorites = Arc<RwLock<FavoritesStore>>;

/// Errors while reading or writing the persisted favorites.
///
/// These never escape the store: reads degrade to an empty set and writes
/// are logged while the in-memory state stays authoritative.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Persisted favorites are corrupted: {0}")]
    Corrupted(String),

    #[error("Failed to serialize favorites: {0}")]
    Serialize(String),
}
