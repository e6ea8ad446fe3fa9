//! HTTP client for the dog service.
//!
//! Authentication is a session cookie set by `POST /auth/login`; the
//! reqwest cookie store replays it on every later call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;

use super::types::{
    DogRecord, LoginRequest, MatchResponse, PageCursor, SearchRequest, SearchResponse,
};
use super::{DogApi, DogApiError};

/// Default service location.
pub const DEFAULT_BASE_URL: &str = "https://frontend-take-home-service.fetch.com";

/// HTTP implementation of [`DogApi`].
pub struct HttpDogApi {
    client: Client,
    base_url: String,
}

impl HttpDogApi {
    /// Create a new client with its own cookie store.
    pub fn new(config: &ApiConfig) -> Result<Self, DogApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve a server-issued cursor to an absolute URL.
    ///
    /// The service hands out path-and-query strings such as
    /// `/dogs/search?size=40&from=40`; bare query strings are accepted too.
    fn cursor_url(&self, token: &str) -> String {
        if token.starts_with("http://") || token.starts_with("https://") {
            token.to_string()
        } else if token.starts_with('/') {
            self.url(token)
        } else {
            format!(
                "{}/dogs/search?{}",
                self.base_url,
                token.trim_start_matches('?')
            )
        }
    }

    fn search_builder(&self, request: &SearchRequest) -> RequestBuilder {
        match &request.cursor {
            PageCursor::Token(token) => self.client.get(self.cursor_url(token)),
            PageCursor::Offset(offset) => {
                let mut builder = self.client.get(self.url("/dogs/search"));
                for breed in &request.breeds {
                    builder = builder.query(&[("breeds", breed.as_str())]);
                }
                builder = builder.query(&[
                    ("sort", request.sort.to_string()),
                    ("size", request.size.to_string()),
                ]);
                if *offset > 0 {
                    builder = builder.query(&[("from", offset.to_string())]);
                }
                builder
            }
        }
    }

    async fn check(response: Response) -> Result<Response, DogApiError> {
        let status = response.status();
        if status == 401 {
            return Err(DogApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DogApiError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, DogApiError> {
        let response = Self::check(response).await?;
        response.json().await.map_err(|e| {
            DogApiError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl DogApi for HttpDogApi {
    async fn login(&self, name: &str, email: &str) -> Result<(), DogApiError> {
        debug!(name = name, "Logging in");

        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { name, email })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), DogApiError> {
        debug!("Logging out");

        let response = self.client.post(self.url("/auth/logout")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn breeds(&self) -> Result<Vec<String>, DogApiError> {
        let response = self.client.get(self.url("/dogs/breeds")).send().await?;
        Self::parse(response, "breeds").await
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, DogApiError> {
        debug!(
            breeds = ?request.breeds,
            sort = %request.sort,
            cursor = ?request.cursor,
            "Dog search"
        );

        let response = self.search_builder(request).send().await?;
        Self::parse(response, "search").await
    }

    async fn fetch_dogs(&self, ids: &[String]) -> Result<Vec<DogRecord>, DogApiError> {
        debug!(count = ids.len(), "Fetching dog records");

        let response = self
            .client
            .post(self.url("/dogs"))
            .json(ids)
            .send()
            .await?;
        Self::parse(response, "dogs").await
    }

    async fn match_dogs(&self, ids: &[String]) -> Result<MatchResponse, DogApiError> {
        debug!(count = ids.len(), "Requesting match");

        let response = self
            .client
            .post(self.url("/dogs/match"))
            .json(ids)
            .send()
            .await?;
        Self::parse(response, "match").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SortDirection, SortField, SortOrder};

    fn client() -> HttpDogApi {
        HttpDogApi::new(&ApiConfig {
            base_url: "https://dogs.test/".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn request(cursor: PageCursor) -> SearchRequest {
        SearchRequest {
            breeds: vec!["Beagle".to_string(), "Golden Retriever".to_string()],
            sort: SortOrder {
                field: SortField::Breed,
                direction: SortDirection::Desc,
            },
            size: 40,
            cursor,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client().base_url(), "https://dogs.test");
    }

    #[test]
    fn test_cursor_url_path() {
        let api = client();
        assert_eq!(
            api.cursor_url("/dogs/search?size=40&from=40"),
            "https://dogs.test/dogs/search?size=40&from=40"
        );
    }

    #[test]
    fn test_cursor_url_query_only() {
        let api = client();
        assert_eq!(
            api.cursor_url("?size=40&from=80"),
            "https://dogs.test/dogs/search?size=40&from=80"
        );
    }

    #[test]
    fn test_cursor_url_absolute() {
        let api = client();
        assert_eq!(
            api.cursor_url("https://other.test/dogs/search?from=40"),
            "https://other.test/dogs/search?from=40"
        );
    }

    #[test]
    fn test_offset_request_query() {
        let api = client();
        let built = api
            .search_builder(&request(PageCursor::Offset(80)))
            .build()
            .unwrap();
        let query = built.url().query().unwrap().to_string();

        assert!(query.contains("breeds=Beagle"));
        assert!(query.contains("breeds=Golden+Retriever"));
        assert!(query.contains("sort=breed%3Adesc"));
        assert!(query.contains("size=40"));
        assert!(query.contains("from=80"));
    }

    #[test]
    fn test_first_page_omits_from() {
        let api = client();
        let built = api
            .search_builder(&request(PageCursor::Offset(0)))
            .build()
            .unwrap();
        let query = built.url().query().unwrap().to_string();
        assert!(!query.contains("from="));
    }

    #[test]
    fn test_token_request_ignores_criteria() {
        let api = client();
        let built = api
            .search_builder(&request(PageCursor::Token(
                "/dogs/search?size=40&from=40".to_string(),
            )))
            .build()
            .unwrap();

        assert_eq!(
            built.url().as_str(),
            "https://dogs.test/dogs/search?size=40&from=40"
        );
    }
}
