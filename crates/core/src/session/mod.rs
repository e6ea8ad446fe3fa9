//! The browsing session: search, favorites and matching wired together.
//!
//! [`Session`] is what a front end drives. It owns the
//! [`SearchController`](crate::search::SearchController), the shared
//! favorites and the [`MatchOrchestrator`](crate::matcher::MatchOrchestrator),
//! tracks the UI state machine and broadcasts [`SessionNotice`]s for
//! anything the user should hear about.

mod runner;
mod state;

pub use runner::Session;
pub use state::{transition, InvalidTransition, SessionEvent, SessionState};

use serde::Serialize;
use thiserror::Error;

use crate::api::DogApiError;
use crate::matcher::MatchError;
use crate::search::SearchError;

/// Capacity of the notice channel. Slow receivers lose the oldest notices.
pub const NOTICE_CAPACITY: usize = 64;

/// Non-blocking messages for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionNotice {
    /// New results were published.
    ResultsUpdated { total: u64, page: u32 },
    /// A search failed; the previous results are still shown.
    SearchFailed { message: String },
    /// The breed list could not be loaded.
    BreedsUnavailable { message: String },
    FavoriteAdded { id: String },
    FavoriteRemoved { id: String },
    MatchFound { id: String, name: String },
    MatchFailed { message: String },
    StartedOver,
}

/// Errors from session actions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Authentication failed: {0}")]
    Auth(#[source] DogApiError),
}
