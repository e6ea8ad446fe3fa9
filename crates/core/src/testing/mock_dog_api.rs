//! Mock dog service for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::api::{
    DogApi, DogApiError, DogRecord, MatchResponse, PageCursor, SearchRequest, SearchResponse,
    SortDirection,
};

/// Operations of the dog service, used to target delays and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Login,
    Logout,
    Breeds,
    Search,
    FetchDogs,
    Match,
}

/// A recorded call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedApiCall {
    Login { name: String, email: String },
    Logout,
    Breeds,
    Search(SearchRequest),
    FetchDogs { ids: Vec<String> },
    Match { ids: Vec<String> },
}

impl RecordedApiCall {
    pub fn operation(&self) -> ApiOperation {
        match self {
            RecordedApiCall::Login { .. } => ApiOperation::Login,
            RecordedApiCall::Logout => ApiOperation::Logout,
            RecordedApiCall::Breeds => ApiOperation::Breeds,
            RecordedApiCall::Search(_) => ApiOperation::Search,
            RecordedApiCall::FetchDogs { .. } => ApiOperation::FetchDogs,
            RecordedApiCall::Match { .. } => ApiOperation::Match,
        }
    }
}

/// Mock implementation of the DogApi trait.
///
/// Provides controllable behavior for testing:
/// - Serve searches out of an in-memory catalog, or from queued responses
/// - Track calls for assertions
/// - Simulate failures and per-call delays (to reorder responses)
///
/// # Example
///
/// ```rust,ignore
/// use fetchmate_core::testing::{MockDogApi, fixtures};
///
/// let api = MockDogApi::new();
/// api.set_dogs(fixtures::dogs(85, "Beagle")).await;
///
/// // First call to search sleeps 50ms, the second returns immediately.
/// api.push_delay(ApiOperation::Search, Duration::from_millis(50)).await;
/// api.push_delay(ApiOperation::Search, Duration::ZERO).await;
/// ```
#[derive(Debug, Default)]
pub struct MockDogApi {
    /// Breed catalog.
    breeds: Arc<RwLock<Vec<String>>>,
    /// Dog catalog, in insertion order.
    dogs: Arc<RwLock<Vec<DogRecord>>>,
    /// Search responses served before falling back to the catalog.
    queued_searches: Arc<RwLock<VecDeque<SearchResponse>>>,
    /// Identifier the match endpoint answers with (default: first requested).
    match_id: Arc<RwLock<Option<String>>>,
    /// Per-operation delays, consumed one per call.
    delays: Arc<RwLock<HashMap<ApiOperation, VecDeque<Duration>>>>,
    /// Per-operation errors, consumed one per call.
    errors: Arc<RwLock<HashMap<ApiOperation, VecDeque<DogApiError>>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedApiCall>>>,
}

impl MockDogApi {
    /// Create a new mock with empty catalogs.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Catalog Configuration
    // =========================================================================

    /// Set the breed list.
    pub async fn set_breeds(&self, breeds: Vec<String>) {
        *self.breeds.write().await = breeds;
    }

    /// Replace the dog catalog.
    pub async fn set_dogs(&self, dogs: Vec<DogRecord>) {
        *self.dogs.write().await = dogs;
    }

    /// Add dogs to the catalog.
    pub async fn add_dogs(&self, dogs: Vec<DogRecord>) {
        self.dogs.write().await.extend(dogs);
    }

    /// Serve `response` for the next search instead of querying the catalog.
    pub async fn queue_search(&self, response: SearchResponse) {
        self.queued_searches.write().await.push_back(response);
    }

    /// Make the match endpoint answer with `id`.
    pub async fn set_match(&self, id: impl Into<String>) {
        *self.match_id.write().await = Some(id.into());
    }

    // =========================================================================
    // Delays and Errors
    // =========================================================================

    /// Delay the next not-yet-delayed call of `operation` by `delay`.
    pub async fn push_delay(&self, operation: ApiOperation, delay: Duration) {
        self.delays
            .write()
            .await
            .entry(operation)
            .or_default()
            .push_back(delay);
    }

    /// Fail the next not-yet-failed call of `operation` with `error`.
    pub async fn push_error(&self, operation: ApiOperation, error: DogApiError) {
        self.errors
            .write()
            .await
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    async fn take_delay(&self, operation: ApiOperation) -> Option<Duration> {
        self.delays
            .write()
            .await
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front())
    }

    async fn take_error(&self, operation: ApiOperation) -> Option<DogApiError> {
        self.errors
            .write()
            .await
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front())
    }

    /// Record the call, apply its delay, then its error if any.
    ///
    /// The delay and error are taken before sleeping so that overlapping
    /// calls consume them in issue order.
    async fn enter(&self, call: RecordedApiCall) -> Result<(), DogApiError> {
        let operation = call.operation();
        self.calls.write().await.push(call);

        let delay = self.take_delay(operation).await;
        let error = self.take_error(operation).await;

        if let Some(delay) = delay {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedApiCall> {
        self.calls.read().await.clone()
    }

    /// Recorded search requests, in issue order.
    pub async fn recorded_searches(&self) -> Vec<SearchRequest> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedApiCall::Search(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of calls made to `operation`.
    pub async fn call_count(&self, operation: ApiOperation) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    // =========================================================================
    // Catalog Search
    // =========================================================================

    async fn search_catalog(&self, request: &SearchRequest) -> SearchResponse {
        let offset = match &request.cursor {
            PageCursor::Offset(offset) => *offset as usize,
            PageCursor::Token(token) => offset_from_token(token),
        };
        let size = request.size.max(1) as usize;

        let dogs = self.dogs.read().await;
        let mut matching: Vec<&DogRecord> = dogs
            .iter()
            .filter(|d| request.breeds.is_empty() || request.breeds.contains(&d.breed))
            .collect();
        matching.sort_by(|a, b| a.breed.cmp(&b.breed).then_with(|| a.id.cmp(&b.id)));
        if request.sort.direction == SortDirection::Desc {
            matching.reverse();
        }

        let total = matching.len();
        let result_ids = matching
            .iter()
            .skip(offset)
            .take(size)
            .map(|d| d.id.clone())
            .collect();

        let next = (offset + size < total)
            .then(|| format!("/dogs/search?size={}&from={}", size, offset + size));
        let prev = (offset > 0).then(|| {
            format!(
                "/dogs/search?size={}&from={}",
                size,
                offset.saturating_sub(size)
            )
        });

        SearchResponse {
            total: total as u64,
            result_ids,
            next,
            prev,
        }
    }
}

/// Extract `from=N` out of a cursor produced by the mock catalog.
fn offset_from_token(token: &str) -> usize {
    token
        .split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("from="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl DogApi for MockDogApi {
    async fn login(&self, name: &str, email: &str) -> Result<(), DogApiError> {
        self.enter(RecordedApiCall::Login {
            name: name.to_string(),
            email: email.to_string(),
        })
        .await
    }

    async fn logout(&self) -> Result<(), DogApiError> {
        self.enter(RecordedApiCall::Logout).await
    }

    async fn breeds(&self) -> Result<Vec<String>, DogApiError> {
        self.enter(RecordedApiCall::Breeds).await?;
        Ok(self.breeds.read().await.clone())
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, DogApiError> {
        // Pick the queued response at call time so overlapping searches
        // get them in issue order.
        let queued = self.queued_searches.write().await.pop_front();
        self.enter(RecordedApiCall::Search(request.clone())).await?;

        match queued {
            Some(response) => Ok(response),
            None => Ok(self.search_catalog(request).await),
        }
    }

    async fn fetch_dogs(&self, ids: &[String]) -> Result<Vec<DogRecord>, DogApiError> {
        self.enter(RecordedApiCall::FetchDogs { ids: ids.to_vec() })
            .await?;

        let dogs = self.dogs.read().await;
        // Return in catalog order rather than request order, like a
        // real backend is free to do.
        Ok(dogs
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn match_dogs(&self, ids: &[String]) -> Result<MatchResponse, DogApiError> {
        self.enter(RecordedApiCall::Match { ids: ids.to_vec() })
            .await?;

        let configured = self.match_id.read().await.clone();
        let matched_id = configured
            .or_else(|| ids.first().cloned())
            .ok_or_else(|| DogApiError::ApiError {
                status: 400,
                message: "empty match request".to_string(),
            })?;

        Ok(MatchResponse { matched_id })
    }
}
