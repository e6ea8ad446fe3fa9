//! Favorites store implementation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::DogRecord;
use crate::metrics;
use crate::storage::KeyValueStorage;

use super::PersistenceError;

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// In-memory favorites set with write-through persistence.
///
/// Records are kept in insertion order and are unique by `id`. Every
/// mutation rewrites the whole persisted value.
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    records: Vec<DogRecord>,
}

impl FavoritesStore {
    /// Hydrate the store from `storage`.
    ///
    /// A missing, unreadable or malformed value yields an empty set.
    pub fn load(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = match Self::read(storage.as_ref(), &key) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %key, "Failed to load favorites, starting empty: {}", e);
                metrics::PERSISTENCE_FAILURES
                    .with_label_values(&["read"])
                    .inc();
                Vec::new()
            }
        };

        debug!(key = %key, count = records.len(), "Favorites loaded");
        Self {
            storage,
            key,
            records,
        }
    }

    fn read(storage: &dyn KeyValueStorage, key: &str) -> Result<Vec<DogRecord>, PersistenceError> {
        let Some(raw) = storage.get(key)? else {
            return Ok(Vec::new());
        };

        let parsed: Vec<DogRecord> =
            serde_json::from_str(&raw).map_err(|e| PersistenceError::Corrupted(e.to_string()))?;

        let mut seen = HashSet::new();
        Ok(parsed
            .into_iter()
            .filter(|record| seen.insert(record.id.clone()))
            .collect())
    }

    fn persist(&self) {
        if let Err(e) = self.write() {
            warn!(key = %self.key, "Failed to persist favorites: {}", e);
            metrics::PERSISTENCE_FAILURES
                .with_label_values(&["write"])
                .inc();
        }
    }

    fn write(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| PersistenceError::Serialize(e.to_string()))?;
        self.storage.set(&self.key, &json)?;
        Ok(())
    }

    /// Add the record if absent, remove it if present, then persist.
    pub fn toggle(&mut self, record: &DogRecord) -> ToggleOutcome {
        let outcome = match self.records.iter().position(|r| r.id == record.id) {
            Some(index) => {
                self.records.remove(index);
                ToggleOutcome::Removed
            }
            None => {
                self.records.push(record.clone());
                ToggleOutcome::Added
            }
        };

        let action = match outcome {
            ToggleOutcome::Added => "added",
            ToggleOutcome::Removed => "removed",
        };
        metrics::FAVORITE_TOGGLES.with_label_values(&[action]).inc();
        debug!(id = %record.id, action = action, "Favorite toggled");

        self.persist();
        outcome
    }

    /// Drop every favorite and persist the empty set.
    ///
    /// Only start-over is allowed to do this.
    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.persist();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&DogRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Favorites in insertion order.
    pub fn list(&self) -> &[DogRecord] {
        &self.records
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
