//! Types for the search controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{DogApiError, DogRecord, SortDirection, SortOrder};
use crate::pagination::{self, PaginationView};

/// Breed filter and sort order.
///
/// Breeds keep their selection order and never repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    breeds: Vec<String>,
    sort: SortOrder,
}

impl SearchCriteria {
    /// Default criteria: every breed, ascending by breed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build criteria from a breed list, dropping repeats.
    pub fn with_breeds<I, S>(breeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut criteria = Self::new();
        for breed in breeds {
            criteria.select_breed(breed);
        }
        criteria
    }

    /// Set the sort direction, builder style.
    pub fn sorted(mut self, direction: SortDirection) -> Self {
        self.sort.direction = direction;
        self
    }

    pub fn breeds(&self) -> &[String] {
        &self.breeds
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn direction(&self) -> SortDirection {
        self.sort.direction
    }

    pub fn set_direction(&mut self, direction: SortDirection) {
        self.sort.direction = direction;
    }

    pub fn is_selected(&self, breed: &str) -> bool {
        self.breeds.iter().any(|b| b == breed)
    }

    /// Add a breed. Returns `false` if it was already selected.
    pub fn select_breed(&mut self, breed: impl Into<String>) -> bool {
        let breed = breed.into();
        if self.is_selected(&breed) {
            return false;
        }
        self.breeds.push(breed);
        true
    }

    /// Remove a breed. Returns `false` if it was not selected.
    pub fn deselect_breed(&mut self, breed: &str) -> bool {
        let before = self.breeds.len();
        self.breeds.retain(|b| b != breed);
        self.breeds.len() != before
    }

    /// Select an unselected breed or deselect a selected one.
    /// Returns whether the breed is selected afterwards.
    pub fn toggle_breed(&mut self, breed: &str) -> bool {
        if self.deselect_breed(breed) {
            false
        } else {
            self.select_breed(breed)
        }
    }

    /// Breeds from `all` that can still be selected, in catalog order.
    pub fn available_breeds<'a>(&self, all: &'a [String]) -> Vec<&'a str> {
        all.iter()
            .filter(|b| !self.is_selected(b))
            .map(String::as_str)
            .collect()
    }
}

/// Which page a search should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// Page 1 with the pending criteria.
    First,
    /// An explicit page number with the criteria currently displayed.
    Page(u32),
    /// Follow the `next` cursor of the displayed result.
    Next,
    /// Follow the `prev` cursor of the displayed result.
    Prev,
}

/// The published result of the most recent applied search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchSnapshot {
    /// Sequence number of the request that produced this snapshot
    /// (0 before any search completed).
    pub seq: u64,
    /// Criteria the search ran with.
    pub criteria: SearchCriteria,
    /// Page shown, reconciled with the response total.
    pub page: u32,
    pub page_size: u32,
    /// Total matches across all pages.
    pub total: u64,
    /// Records in search result order.
    pub records: Vec<DogRecord>,
    pub next: Option<String>,
    pub prev: Option<String>,
}

impl SearchSnapshot {
    pub(crate) fn empty(page_size: u32) -> Self {
        Self {
            seq: 0,
            criteria: SearchCriteria::default(),
            page: 1,
            page_size,
            total: 0,
            records: Vec::new(),
            next: None,
            prev: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total, self.page_size)
    }

    /// "Found 85 dogs" / "No dogs found"
    pub fn status_line(&self) -> String {
        if self.total > 0 {
            format!("Found {} dogs", self.total)
        } else {
            "No dogs found".to_string()
        }
    }

    /// Page bar for this snapshot, `None` when everything fits on one page.
    pub fn pagination(&self) -> Option<PaginationView> {
        PaginationView::build(self.total, self.page_size, self.page)
    }
}

/// What became of a search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was published.
    Applied(SearchSnapshot),
    /// A newer search was issued before this one settled; its response
    /// (or failure) was discarded.
    Superseded { seq: u64 },
    /// Nothing to do: navigation guard rejected the page, or the cursor
    /// to follow does not exist.
    Skipped,
}

impl SearchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SearchOutcome::Applied(_))
    }
}

/// Errors from the two-phase search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The id search failed.
    #[error("Dog search failed: {0}")]
    Search(#[source] DogApiError),

    /// Fetching records for the returned ids failed.
    #[error("Fetching dog records failed: {0}")]
    Fetch(#[source] DogApiError),
}
