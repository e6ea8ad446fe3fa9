//! Match generation from the user's favorites.

mod orchestrator;

pub use orchestrator::MatchOrchestrator;

use thiserror::Error;

use crate::api::DogApiError;

/// Errors from match generation.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The match endpoint failed.
    #[error("Match request failed: {0}")]
    Api(#[from] DogApiError),

    /// The service picked a dog that is no longer a favorite.
    #[error("Matched dog {0} is not among the current favorites")]
    Unresolved(String),

    /// Another match request has not settled yet.
    #[error("A match is already being generated")]
    MatchInProgress,
}
