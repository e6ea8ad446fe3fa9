//! Match orchestrator implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{DogApi, DogRecord};
use crate::favorites::SharedFavorites;
use crate::metrics;

use super::MatchError;

/// Clears the in-progress flag when a match request settles.
struct Pending<'a>(&'a AtomicBool);

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Asks the service to pick one dog out of the favorites.
pub struct MatchOrchestrator {
    api: Arc<dyn DogApi>,
    in_progress: AtomicBool,
    current: RwLock<Option<DogRecord>>,
}

impl MatchOrchestrator {
    pub fn new(api: Arc<dyn DogApi>) -> Self {
        Self {
            api,
            in_progress: AtomicBool::new(false),
            current: RwLock::new(None),
        }
    }

    /// Request a match for the current favorites.
    ///
    /// Returns `Ok(None)` without calling the service when there are no
    /// favorites. The returned id is resolved against the favorites as
    /// they are when the response arrives, not when the request was sent.
    pub async fn generate_match(
        &self,
        favorites: &SharedFavorites,
    ) -> Result<Option<DogRecord>, MatchError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MatchError::MatchInProgress);
        }
        let _pending = Pending(&self.in_progress);

        let ids = favorites.read().await.ids();
        if ids.is_empty() {
            debug!("No favorites, nothing to match");
            return Ok(None);
        }

        debug!(candidates = ids.len(), "Requesting match");
        let response = match self.api.match_dogs(&ids).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Match request failed: {}", e);
                metrics::MATCH_REQUESTS.with_label_values(&["failed"]).inc();
                return Err(e.into());
            }
        };

        let resolved = favorites.read().await.get(&response.matched_id).cloned();
        let Some(record) = resolved else {
            warn!(id = %response.matched_id, "Matched dog is no longer a favorite");
            metrics::MATCH_REQUESTS
                .with_label_values(&["unresolved"])
                .inc();
            return Err(MatchError::Unresolved(response.matched_id));
        };

        info!(id = %record.id, name = %record.name, "Match found");
        metrics::MATCH_REQUESTS.with_label_values(&["matched"]).inc();
        *self.current.write().await = Some(record.clone());
        Ok(Some(record))
    }

    /// The held match, if any.
    pub async fn current(&self) -> Option<DogRecord> {
        self.current.read().await.clone()
    }

    /// Drop the held match and wipe the favorites.
    pub async fn start_over(&self, favorites: &SharedFavorites) {
        favorites.write().await.clear();
        *self.current.write().await = None;
        info!("Started over, favorites cleared");
    }
}
