//! Thin HTTP client for the tracker's v3 REST API.
//!
//! The [`EpicSource`] trait is the seam the resolution pipeline is written
//! against; [`ShortcutClient`] is the production implementation. Each method
//! is one GET and returns the typed error taxonomy, never a panic.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::FetchError;
use crate::shortcut::models::{Epic, EpicSearchResults, Member, Story, Workflow};

const API_BASE: &str = "https://api.app.shortcut.com/api/v3";
const AUTH_HEADER: &str = "Shortcut-Token";
const SEARCH_PAGE_SIZE: u32 = 25;

/// Hard per-request deadline. A hung request must not wedge a watch cycle.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Body substrings that mark a non-401/403 failure as auth-flavored. The
/// tracker reports disabled or malformed tokens as 422 with a prose body.
const AUTH_ERROR_MARKERS: &[&str] = &["token", "unauthorized", "authentication"];

/// Read operations the dashboard needs from the tracker.
#[async_trait]
pub trait EpicSource {
    /// Full-text epic search; returns candidates for exact-match filtering.
    async fn search_epics(&self, query: &str) -> Result<Vec<Epic>, FetchError>;

    /// Fetch one epic by id.
    async fn epic(&self, id: i64) -> Result<Epic, FetchError>;

    /// All non-archived stories of an epic.
    async fn epic_stories(&self, epic_id: i64) -> Result<Vec<Story>, FetchError>;

    /// Fetch one member by id.
    async fn member(&self, id: Uuid) -> Result<Member, FetchError>;

    /// All workflows in the workspace.
    async fn workflows(&self) -> Result<Vec<Workflow>, FetchError>;
}

/// Production client against the hosted tracker API.
pub struct ShortcutClient {
    http: reqwest::Client,
    token: String,
}

impl ShortcutClient {
    pub fn new(token: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            token: token.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{API_BASE}{path}");
        tracing::debug!(%url, "tracker request");
        let resp = self
            .http
            .get(&url)
            .header(AUTH_HEADER, &self.token)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, message));
        }
        Ok(resp.json::<T>().await?)
    }
}

/// Map a non-success response onto the error taxonomy. 401 and 403 are
/// always auth; any other status counts as auth only when the body carries
/// one of the token-flavored markers.
fn classify_failure(status: StatusCode, message: String) -> FetchError {
    let lowered = message.to_lowercase();
    let token_flavored = AUTH_ERROR_MARKERS.iter().any(|m| lowered.contains(m));
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || token_flavored {
        FetchError::Auth {
            status: status.as_u16(),
            message,
        }
    } else {
        FetchError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl EpicSource for ShortcutClient {
    async fn search_epics(&self, query: &str) -> Result<Vec<Epic>, FetchError> {
        let results: EpicSearchResults = self
            .get_json(
                "/search/epics",
                &[
                    ("query", query.to_string()),
                    ("page_size", SEARCH_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(results.data)
    }

    async fn epic(&self, id: i64) -> Result<Epic, FetchError> {
        self.get_json(&format!("/epics/{id}"), &[]).await
    }

    async fn epic_stories(&self, epic_id: i64) -> Result<Vec<Story>, FetchError> {
        let stories: Vec<Story> = self
            .get_json(&format!("/epics/{epic_id}/stories"), &[])
            .await?;
        // Archived stories stay on the endpoint but never on the board.
        Ok(stories.into_iter().filter(|s| !s.archived).collect())
    }

    async fn member(&self, id: Uuid) -> Result<Member, FetchError> {
        self.get_json(&format!("/members/{id}"), &[]).await
    }

    async fn workflows(&self) -> Result<Vec<Workflow>, FetchError> {
        self.get_json("/workflows", &[]).await
    }
}
