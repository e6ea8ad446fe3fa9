//! Search controller implementation.
//!
//! Every search is stamped with a sequence number when it is issued. A
//! response is only published if no newer search was issued while it was
//! in flight; the check runs after the id search and again after the body
//! fetch, so a superseded request never costs a body fetch it won't use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{DogApi, DogRecord, PageCursor, SearchRequest, SortDirection};
use crate::metrics;
use crate::pagination::{self, PAGE_SIZE};

use super::types::{PageRequest, SearchCriteria, SearchError, SearchOutcome, SearchSnapshot};

/// A resolved page request, ready to send.
#[derive(Debug, Clone)]
struct SearchPlan {
    seq: u64,
    criteria: SearchCriteria,
    page: u32,
    request: SearchRequest,
}

#[derive(Debug)]
struct ControllerState {
    /// Criteria being edited in the filter panel.
    criteria: SearchCriteria,
    /// Last published result.
    current: SearchSnapshot,
    /// Page targeted by the newest in-flight request.
    provisional_page: Option<u32>,
}

/// Decrements the in-flight counter when a search settles.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns search criteria and pagination, and publishes search results.
pub struct SearchController {
    api: Arc<dyn DogApi>,
    page_size: u32,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    state: RwLock<ControllerState>,
}

impl SearchController {
    /// Create a controller with default criteria and nothing published.
    pub fn new(api: Arc<dyn DogApi>) -> Self {
        Self {
            api,
            page_size: PAGE_SIZE,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            state: RwLock::new(ControllerState {
                criteria: SearchCriteria::default(),
                current: SearchSnapshot::empty(PAGE_SIZE),
                provisional_page: None,
            }),
        }
    }

    // =========================================================================
    // Published state
    // =========================================================================

    /// The last published result.
    pub async fn snapshot(&self) -> SearchSnapshot {
        self.state.read().await.current.clone()
    }

    /// Authoritative page of the published result.
    pub async fn current_page(&self) -> u32 {
        self.state.read().await.current.page
    }

    /// Page the newest in-flight request is heading to, if any.
    pub async fn provisional_page(&self) -> Option<u32> {
        if !self.is_loading() {
            return None;
        }
        self.state.read().await.provisional_page
    }

    /// Whether any issued search has not settled yet.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    // =========================================================================
    // Filter actions
    // =========================================================================

    /// Criteria as currently edited (not necessarily searched yet).
    pub async fn criteria(&self) -> SearchCriteria {
        self.state.read().await.criteria.clone()
    }

    /// Toggle a breed in the pending criteria. Returns whether it is selected.
    pub async fn toggle_breed(&self, breed: &str) -> bool {
        self.state.write().await.criteria.toggle_breed(breed)
    }

    /// Change the pending sort direction.
    pub async fn set_sort_direction(&self, direction: SortDirection) {
        self.state.write().await.criteria.set_direction(direction);
    }

    /// Breeds from `all` that are not selected yet.
    pub async fn available_breeds(&self, all: &[String]) -> Vec<String> {
        let state = self.state.read().await;
        state
            .criteria
            .available_breeds(all)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Replace the criteria and search the first page.
    pub async fn update_criteria(
        &self,
        criteria: SearchCriteria,
    ) -> Result<SearchOutcome, SearchError> {
        // Rebuild through `with_breeds` so repeats can't sneak in.
        let criteria =
            SearchCriteria::with_breeds(criteria.breeds().to_vec()).sorted(criteria.direction());
        self.state.write().await.criteria = criteria;
        self.search(PageRequest::First).await
    }

    /// Search the first page with the pending criteria.
    pub async fn apply_filters(&self) -> Result<SearchOutcome, SearchError> {
        self.search(PageRequest::First).await
    }

    /// Restore default criteria and search the first page.
    pub async fn reset_filters(&self) -> Result<SearchOutcome, SearchError> {
        self.update_criteria(SearchCriteria::default()).await
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go to page `page`, if the navigation guard allows it.
    pub async fn go_to_page(&self, page: u32) -> Result<SearchOutcome, SearchError> {
        self.search(PageRequest::Page(page)).await
    }

    pub async fn next_page(&self) -> Result<SearchOutcome, SearchError> {
        self.search(PageRequest::Next).await
    }

    pub async fn prev_page(&self) -> Result<SearchOutcome, SearchError> {
        self.search(PageRequest::Prev).await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Run the two-phase search for `request`.
    ///
    /// On failure the published result is left untouched. Failures and
    /// responses of superseded requests are reported as
    /// [`SearchOutcome::Superseded`].
    pub async fn search(&self, request: PageRequest) -> Result<SearchOutcome, SearchError> {
        let Some(plan) = self.plan(request).await else {
            debug!(?request, "Page request skipped");
            return Ok(SearchOutcome::Skipped);
        };

        let _in_flight = InFlight::enter(&self.in_flight);
        let started = Instant::now();
        let seq = plan.seq;

        let result = self.execute(plan).await;

        let label = match &result {
            Ok(SearchOutcome::Applied(_)) => "applied",
            Ok(_) => "superseded",
            Err(_) => "failed",
        };
        metrics::SEARCHES_TOTAL.with_label_values(&[label]).inc();
        metrics::SEARCH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!(seq = seq, "Search failed, keeping previous results: {}", e);
            let mut state = self.state.write().await;
            if !self.is_superseded(seq) {
                state.provisional_page = None;
            }
        }
        result
    }

    /// Resolve a page request against the published state and stamp it.
    ///
    /// Planning and stamping happen under the state lock so sequence
    /// numbers follow issue order.
    async fn plan(&self, request: PageRequest) -> Option<SearchPlan> {
        let mut state = self.state.write().await;
        let current = &state.current;

        let (criteria, page, cursor) = match request {
            PageRequest::First => (state.criteria.clone(), 1, PageCursor::Offset(0)),
            PageRequest::Page(target) => {
                if !pagination::can_navigate(current.page, target, current.total_pages()) {
                    return None;
                }
                let cursor = match (&current.next, &current.prev) {
                    (Some(next), _) if target == current.page + 1 => {
                        PageCursor::Token(next.clone())
                    }
                    (_, Some(prev)) if target + 1 == current.page => {
                        PageCursor::Token(prev.clone())
                    }
                    _ => PageCursor::Offset(pagination::offset_for(target, self.page_size)),
                };
                (current.criteria.clone(), target, cursor)
            }
            PageRequest::Next => {
                let next = current.next.clone()?;
                (
                    current.criteria.clone(),
                    current.page.saturating_add(1),
                    PageCursor::Token(next),
                )
            }
            PageRequest::Prev => {
                let prev = current.prev.clone()?;
                (
                    current.criteria.clone(),
                    current.page.saturating_sub(1).max(1),
                    PageCursor::Token(prev),
                )
            }
        };

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        state.provisional_page = Some(page);

        debug!(seq = seq, page = page, cursor = ?cursor, "Search issued");
        Some(SearchPlan {
            seq,
            request: SearchRequest {
                breeds: criteria.breeds().to_vec(),
                sort: criteria.sort(),
                size: self.page_size,
                cursor,
            },
            criteria,
            page,
        })
    }

    fn is_superseded(&self, seq: u64) -> bool {
        self.issued.load(Ordering::SeqCst) > seq
    }

    async fn execute(&self, plan: SearchPlan) -> Result<SearchOutcome, SearchError> {
        let seq = plan.seq;

        let response = match self.api.search(&plan.request).await {
            Ok(response) => response,
            Err(_) if self.is_superseded(seq) => return Ok(self.discard(seq, "ids")),
            Err(e) => return Err(SearchError::Search(e)),
        };
        if self.is_superseded(seq) {
            return Ok(self.discard(seq, "ids"));
        }

        let records = if response.result_ids.is_empty() {
            Vec::new()
        } else {
            match self.api.fetch_dogs(&response.result_ids).await {
                Ok(records) => order_by_ids(&response.result_ids, records),
                Err(_) if self.is_superseded(seq) => return Ok(self.discard(seq, "bodies")),
                Err(e) => return Err(SearchError::Fetch(e)),
            }
        };

        let mut state = self.state.write().await;
        if self.is_superseded(seq) || state.current.seq > seq {
            return Ok(self.discard(seq, "bodies"));
        }

        let total_pages = pagination::total_pages(response.total, self.page_size).max(1);
        let snapshot = SearchSnapshot {
            seq,
            criteria: plan.criteria,
            page: plan.page.clamp(1, total_pages),
            page_size: self.page_size,
            total: response.total,
            records,
            next: response.next,
            prev: response.prev,
        };

        info!(
            seq = seq,
            total = snapshot.total,
            page = snapshot.page,
            shown = snapshot.records.len(),
            "Search results published"
        );

        state.current = snapshot.clone();
        state.provisional_page = None;
        Ok(SearchOutcome::Applied(snapshot))
    }

    fn discard(&self, seq: u64, phase: &str) -> SearchOutcome {
        debug!(seq = seq, phase = phase, "Discarding stale search response");
        metrics::STALE_RESPONSES.with_label_values(&[phase]).inc();
        SearchOutcome::Superseded { seq }
    }
}

/// Put fetched records back into search result order.
///
/// Ids the service did not return a record for are dropped.
fn order_by_ids(ids: &[String], records: Vec<DogRecord>) -> Vec<DogRecord> {
    let mut by_id: HashMap<String, DogRecord> =
        records.into_iter().map(|r| (r.id.clone(), r)).collect();
    let ordered: Vec<DogRecord> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    if ordered.len() != ids.len() {
        debug!(
            requested = ids.len(),
            received = ordered.len(),
            "Some dog records were not returned"
        );
    }
    ordered
}
