//! Types exchanged with the remote dog service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dog record as returned by `POST /dogs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DogRecord {
    /// Unique identifier.
    pub id: String,
    /// Image URL.
    pub img: String,
    /// Dog name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Zip code where the dog is located.
    pub zip_code: String,
    /// Breed name.
    pub breed: String,
}

impl DogRecord {
    /// Human readable age, e.g. "1 year" or "3 years".
    pub fn age_label(&self) -> String {
        if self.age == 1 {
            "1 year".to_string()
        } else {
            format!("{} years", self.age)
        }
    }
}

/// Field the search results are ordered by.
///
/// The service supports more fields, but the catalog browser only
/// ever sorts by breed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Breed,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Breed => "breed",
        }
    }
}

/// Ordering direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort parameter, rendered on the wire as `field:direction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field.as_str(), self.direction.as_str())
    }
}

/// Where a search page starts.
///
/// A server-issued token always wins over a locally computed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Opaque `next`/`prev` value from a previous search response.
    Token(String),
    /// Item offset computed from a page number.
    Offset(u32),
}

/// Parameters for `GET /dogs/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Breed filter; empty means all breeds.
    pub breeds: Vec<String>,
    pub sort: SortOrder,
    /// Page length.
    pub size: u32,
    pub cursor: PageCursor,
}

/// Response of `GET /dogs/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    /// Total number of matching dogs across all pages.
    pub total: u64,
    /// Identifiers on this page, in result order.
    #[serde(rename = "resultIds", default)]
    pub result_ids: Vec<String>,
    /// Cursor for the following page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Cursor for the preceding page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// Response of `POST /dogs/match`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub matched_id: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
}
