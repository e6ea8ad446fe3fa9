//! Remote dog service integration.
//!
//! The service exposes a two-phase search (ids first, then bodies by id),
//! a match endpoint and a cookie-based session. Everything the core needs
//! from it goes through the [`DogApi`] trait so that the controllers can be
//! driven by [`crate::testing::MockDogApi`] in tests.

mod http;
mod types;

pub use http::{HttpDogApi, DEFAULT_BASE_URL};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the dog service.
#[derive(Debug, Error)]
pub enum DogApiError {
    /// Request could not be completed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Session cookie missing or expired.
    #[error("Not authenticated")]
    Unauthorized,

    /// Service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Capability interface over the remote dog service.
#[async_trait]
pub trait DogApi: Send + Sync {
    /// Start an authenticated session.
    async fn login(&self, name: &str, email: &str) -> Result<(), DogApiError>;

    /// End the current session.
    async fn logout(&self) -> Result<(), DogApiError>;

    /// All breed names known to the service, in service order.
    async fn breeds(&self) -> Result<Vec<String>, DogApiError>;

    /// Search for matching dog identifiers.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, DogApiError>;

    /// Fetch full records for the given identifiers.
    async fn fetch_dogs(&self, ids: &[String]) -> Result<Vec<DogRecord>, DogApiError>;

    /// Ask the service to pick one dog out of the given identifiers.
    async fn match_dogs(&self, ids: &[String]) -> Result<MatchResponse, DogApiError>;
}
