//! Session implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::api::{DogApi, DogRecord, SortDirection};
use crate::favorites::{FavoritesStore, SharedFavorites, ToggleOutcome};
use crate::matcher::MatchOrchestrator;
use crate::pagination::PaginationView;
use crate::search::{
    PageRequest, SearchController, SearchCriteria, SearchError, SearchOutcome, SearchSnapshot,
};
use crate::storage::KeyValueStorage;

use super::state::{transition, SessionEvent, SessionState};
use super::{SessionError, SessionNotice, NOTICE_CAPACITY};

/// A user's browsing session.
pub struct Session {
    api: Arc<dyn DogApi>,
    search: SearchController,
    favorites: SharedFavorites,
    matcher: MatchOrchestrator,
    breeds: RwLock<Vec<String>>,
    state: RwLock<SessionState>,
    notices: broadcast::Sender<SessionNotice>,
}

impl Session {
    /// Create a session, hydrating favorites from `storage` under `favorites_key`.
    pub fn new(
        api: Arc<dyn DogApi>,
        storage: Arc<dyn KeyValueStorage>,
        favorites_key: impl Into<String>,
    ) -> Self {
        let favorites = FavoritesStore::load(storage, favorites_key);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            search: SearchController::new(api.clone()),
            matcher: MatchOrchestrator::new(api.clone()),
            api,
            favorites: Arc::new(RwLock::new(favorites)),
            breeds: RwLock::new(Vec::new()),
            state: RwLock::new(SessionState::default()),
            notices,
        }
    }

    /// Subscribe to session notices.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    fn notify(&self, notice: SessionNotice) {
        // No receivers is fine.
        let _ = self.notices.send(notice);
    }

    pub async fn state(&self) -> SessionState {
        self.effective(*self.state.read().await)
    }

    // Loading is never stored: it holds exactly while a search is in flight,
    // so a dropped search future cannot leave the session stuck in it.
    fn effective(&self, stored: SessionState) -> SessionState {
        if stored == SessionState::Browsing && self.search.is_loading() {
            SessionState::Loading
        } else {
            stored
        }
    }

    async fn fire(&self, event: SessionEvent) -> Result<SessionState, SessionError> {
        let mut state = self.state.write().await;
        let current = self.effective(*state);
        let next = transition(current, event)?;
        debug!(from = %current, event = %event, to = %next, "Session transition");
        *state = match next {
            SessionState::Loading => SessionState::Browsing,
            other => other,
        };
        Ok(next)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&self, name: &str, email: &str) -> Result<(), SessionError> {
        self.api
            .login(name, email)
            .await
            .map_err(SessionError::Auth)?;
        info!(name = %name, "Logged in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.api.logout().await.map_err(SessionError::Auth)?;
        info!("Logged out");
        Ok(())
    }

    // =========================================================================
    // Start-up
    // =========================================================================

    /// Load the breed list and the first page of results concurrently.
    ///
    /// A missing breed list is reported as a notice; a failed first search
    /// is returned like any other search failure.
    pub async fn start(&self) -> Result<SearchOutcome, SessionError> {
        let (_, first) = futures::join!(self.load_breeds(), self.apply_filters());
        first
    }

    async fn load_breeds(&self) {
        match self.api.breeds().await {
            Ok(breeds) => {
                debug!(count = breeds.len(), "Breeds loaded");
                *self.breeds.write().await = breeds;
            }
            Err(e) => {
                warn!("Failed to load breeds: {}", e);
                self.notify(SessionNotice::BreedsUnavailable {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Every breed known to the service.
    pub async fn breeds(&self) -> Vec<String> {
        self.breeds.read().await.clone()
    }

    /// Breeds that can still be added to the filter.
    pub async fn available_breeds(&self) -> Vec<String> {
        let breeds = self.breeds.read().await;
        self.search.available_breeds(&breeds).await
    }

    // =========================================================================
    // Filters and paging
    // =========================================================================

    pub async fn criteria(&self) -> SearchCriteria {
        self.search.criteria().await
    }

    /// Toggle a breed in the pending filter. Returns whether it is selected.
    pub async fn toggle_breed(&self, breed: &str) -> bool {
        self.search.toggle_breed(breed).await
    }

    pub async fn set_sort_direction(&self, direction: SortDirection) {
        self.search.set_sort_direction(direction).await;
    }

    pub async fn apply_filters(&self) -> Result<SearchOutcome, SessionError> {
        self.run_search(self.search.apply_filters()).await
    }

    pub async fn reset_filters(&self) -> Result<SearchOutcome, SessionError> {
        self.run_search(self.search.reset_filters()).await
    }

    pub async fn update_criteria(
        &self,
        criteria: SearchCriteria,
    ) -> Result<SearchOutcome, SessionError> {
        self.run_search(self.search.update_criteria(criteria)).await
    }

    pub async fn go_to_page(&self, page: u32) -> Result<SearchOutcome, SessionError> {
        self.run_search(self.search.go_to_page(page)).await
    }

    pub async fn next_page(&self) -> Result<SearchOutcome, SessionError> {
        self.run_search(self.search.search(PageRequest::Next)).await
    }

    pub async fn prev_page(&self) -> Result<SearchOutcome, SessionError> {
        self.run_search(self.search.search(PageRequest::Prev)).await
    }

    async fn run_search<F>(&self, search: F) -> Result<SearchOutcome, SessionError>
    where
        F: Future<Output = Result<SearchOutcome, SearchError>>,
    {
        self.fire(SessionEvent::Search).await?;
        let result = search.await;

        match &result {
            Ok(SearchOutcome::Applied(snapshot)) => {
                self.notify(SessionNotice::ResultsUpdated {
                    total: snapshot.total,
                    page: snapshot.page,
                });
            }
            Ok(_) => {}
            Err(e) => {
                self.notify(SessionNotice::SearchFailed {
                    message: e.to_string(),
                });
            }
        }

        result.map_err(SessionError::from)
    }

    /// The published results.
    pub async fn snapshot(&self) -> SearchSnapshot {
        self.search.snapshot().await
    }

    /// Page bar for the published results.
    pub async fn pagination(&self) -> Option<PaginationView> {
        self.search.snapshot().await.pagination()
    }

    /// Page the pending search is heading to, or the published page.
    pub async fn display_page(&self) -> u32 {
        match self.search.provisional_page().await {
            Some(page) => page,
            None => self.search.current_page().await,
        }
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    pub async fn favorites(&self) -> Vec<DogRecord> {
        self.favorites.read().await.list().to_vec()
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.favorites.read().await.contains(id)
    }

    /// Add or remove a favorite. Available in every state.
    pub async fn toggle_favorite(&self, record: &DogRecord) -> ToggleOutcome {
        let outcome = self.favorites.write().await.toggle(record);
        let id = record.id.clone();
        self.notify(match outcome {
            ToggleOutcome::Added => SessionNotice::FavoriteAdded { id },
            ToggleOutcome::Removed => SessionNotice::FavoriteRemoved { id },
        });
        outcome
    }

    pub async fn open_favorites(&self) -> Result<(), SessionError> {
        self.fire(SessionEvent::OpenFavorites).await?;
        Ok(())
    }

    /// Leave the favorites list or the match card.
    pub async fn close(&self) -> Result<(), SessionError> {
        self.fire(SessionEvent::Close).await?;
        Ok(())
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Ask for a match among the favorites.
    ///
    /// Only available from the favorites list. With no favorites this is a
    /// no-op that returns `Ok(None)` and leaves the state alone.
    pub async fn generate_match(&self) -> Result<Option<DogRecord>, SessionError> {
        if self.favorites.read().await.is_empty() {
            debug!("Match requested without favorites");
            return Ok(None);
        }

        self.fire(SessionEvent::GenerateMatch).await?;
        let result = self.matcher.generate_match(&self.favorites).await;

        match result {
            Ok(Some(record)) => {
                self.fire(SessionEvent::MatchSucceeded).await?;
                self.notify(SessionNotice::MatchFound {
                    id: record.id.clone(),
                    name: record.name.clone(),
                });
                Ok(Some(record))
            }
            Ok(None) => {
                // Favorites were emptied while the request was pending.
                self.fire(SessionEvent::MatchFailed).await?;
                Ok(None)
            }
            Err(e) => {
                self.fire(SessionEvent::MatchFailed).await?;
                self.notify(SessionNotice::MatchFailed {
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    pub async fn current_match(&self) -> Option<DogRecord> {
        self.matcher.current().await
    }

    /// Clear favorites and the held match, then return to browsing.
    pub async fn start_over(&self) -> Result<(), SessionError> {
        self.fire(SessionEvent::StartOver).await?;
        self.matcher.start_over(&self.favorites).await;
        self.notify(SessionNotice::StartedOver);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DogApiError;
    use crate::matcher::MatchError;
    use crate::testing::{fixtures, ApiOperation, MemoryStorage, MockDogApi};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    async fn session_with(dogs: Vec<DogRecord>) -> (Arc<MockDogApi>, Session) {
        let api = Arc::new(MockDogApi::new());
        api.set_breeds(vec!["Beagle".to_string(), "Pug".to_string()])
            .await;
        api.set_dogs(dogs).await;
        let session = Session::new(api.clone(), Arc::new(MemoryStorage::new()), "favorites");
        (api, session)
    }

    #[tokio::test]
    async fn test_start_loads_breeds_and_first_page() {
        let (api, session) = session_with(fixtures::dogs(85, "Beagle")).await;

        let outcome = session.start().await.unwrap();
        assert!(outcome.is_applied());
        assert_eq!(session.breeds().await, vec!["Beagle", "Pug"]);
        assert_eq!(session.snapshot().await.records.len(), 40);
        assert_eq!(session.state().await, SessionState::Browsing);
        assert_eq!(api.call_count(ApiOperation::Breeds).await, 1);
    }

    #[tokio::test]
    async fn test_breed_failure_is_a_notice() {
        let (api, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        api.push_error(ApiOperation::Breeds, DogApiError::Unauthorized)
            .await;
        let mut notices = session.subscribe();

        session.start().await.unwrap();
        assert!(session.breeds().await.is_empty());

        let mut saw_breeds_notice = false;
        while let Ok(notice) = notices.try_recv() {
            if matches!(notice, SessionNotice::BreedsUnavailable { .. }) {
                saw_breeds_notice = true;
            }
        }
        assert!(saw_breeds_notice);
    }

    #[tokio::test]
    async fn test_search_failure_returns_to_browsing() {
        let (api, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        session.start().await.unwrap();
        let before = session.snapshot().await;

        api.push_error(
            ApiOperation::Search,
            DogApiError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            },
        )
        .await;
        let mut notices = session.subscribe();
        let result = session.apply_filters().await;

        assert!(matches!(result, Err(SessionError::Search(_))));
        assert_eq!(session.state().await, SessionState::Browsing);
        assert_eq!(session.snapshot().await, before);
        assert!(matches!(
            notices.try_recv().unwrap(),
            SessionNotice::SearchFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_loading_while_search_in_flight() {
        let (api, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        api.push_delay(ApiOperation::Search, Duration::from_millis(50))
            .await;

        let search = session.apply_filters();
        let observe = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let during = session.state().await;
            let opened = session.open_favorites().await;
            (during, opened)
        };
        let (result, (during, opened)) = futures::join!(search, observe);

        assert_ok!(result);
        assert_eq!(during, SessionState::Loading);
        assert!(matches!(opened, Err(SessionError::InvalidTransition(_))));
        assert_eq!(session.state().await, SessionState::Browsing);
    }

    #[tokio::test]
    async fn test_abandoned_search_does_not_block_session() {
        let (api, session) = session_with(fixtures::dogs(200, "Beagle")).await;
        assert_ok!(session.start().await);
        api.push_delay(ApiOperation::Search, Duration::from_millis(200))
            .await;

        let abandoned = tokio::time::timeout(Duration::from_millis(20), session.go_to_page(3));
        assert_err!(abandoned.await);

        assert_eq!(session.state().await, SessionState::Browsing);
        assert_eq!(session.display_page().await, 1);
        assert_ok!(session.open_favorites().await);
        assert_eq!(session.state().await, SessionState::ViewingFavorites);
    }

    #[tokio::test]
    async fn test_available_breeds_follow_filter() {
        let (_, session) = session_with(vec![]).await;
        session.start().await.unwrap();

        assert!(session.toggle_breed("Pug").await);
        assert_eq!(session.available_breeds().await, vec!["Beagle"]);
    }

    #[tokio::test]
    async fn test_search_not_allowed_from_favorites() {
        let (_, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        session.open_favorites().await.unwrap();

        let result = session.apply_filters().await;
        assert!(matches!(result, Err(SessionError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_match_flow() {
        let (api, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        session.start().await.unwrap();
        let records = session.snapshot().await.records;
        session.toggle_favorite(&records[0]).await;
        session.toggle_favorite(&records[3]).await;
        api.set_match(records[3].id.clone()).await;

        session.open_favorites().await.unwrap();
        let matched = session.generate_match().await.unwrap();

        assert_eq!(matched, Some(records[3].clone()));
        assert_eq!(session.state().await, SessionState::MatchShown);
        assert_eq!(session.current_match().await, Some(records[3].clone()));

        session.start_over().await.unwrap();
        assert_eq!(session.state().await, SessionState::Browsing);
        assert!(session.favorites().await.is_empty());
        assert!(session.current_match().await.is_none());
    }

    #[tokio::test]
    async fn test_match_without_favorites_is_noop() {
        let (api, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        session.open_favorites().await.unwrap();

        assert!(session.generate_match().await.unwrap().is_none());
        assert_eq!(session.state().await, SessionState::ViewingFavorites);
        assert_eq!(api.call_count(ApiOperation::Match).await, 0);
    }

    #[tokio::test]
    async fn test_match_failure_returns_to_favorites() {
        let (api, session) = session_with(fixtures::dogs(5, "Beagle")).await;
        session.toggle_favorite(&fixtures::dog("beagle-000", "Beagle")).await;
        api.push_error(ApiOperation::Match, DogApiError::Unauthorized)
            .await;

        session.open_favorites().await.unwrap();
        let result = session.generate_match().await;

        assert!(matches!(result, Err(SessionError::Match(MatchError::Api(_)))));
        assert_eq!(session.state().await, SessionState::ViewingFavorites);
        assert!(session.current_match().await.is_none());
    }

    #[tokio::test]
    async fn test_start_over_only_from_match() {
        let (_, session) = session_with(vec![]).await;
        session.toggle_favorite(&fixtures::dog("a", "Pug")).await;

        assert!(session.start_over().await.is_err());
        assert!(session.is_favorite("a").await);
    }

    #[tokio::test]
    async fn test_toggle_notices() {
        let (_, session) = session_with(vec![]).await;
        let mut notices = session.subscribe();
        let dog = fixtures::dog("a", "Pug");

        assert_eq!(session.toggle_favorite(&dog).await, ToggleOutcome::Added);
        assert_eq!(session.toggle_favorite(&dog).await, ToggleOutcome::Removed);

        assert_eq!(
            notices.try_recv().unwrap(),
            SessionNotice::FavoriteAdded { id: "a".to_string() }
        );
        assert_eq!(
            notices.try_recv().unwrap(),
            SessionNotice::FavoriteRemoved { id: "a".to_string() }
        );
    }

    #[tokio::test]
    async fn test_display_page_after_navigation() {
        let (_, session) = session_with(fixtures::dogs(200, "Beagle")).await;
        session.start().await.unwrap();

        session.go_to_page(3).await.unwrap();
        assert_eq!(session.display_page().await, 3);
        assert_eq!(session.pagination().await.unwrap().current_page, 3);
    }
}
