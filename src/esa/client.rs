//! esa API client
//!
//! One call per listing request: `GET /v1/teams/:team/posts`.

use url::Url;

use super::models::PostsPage;
use crate::error::AppError;

/// Parameters of one posts search, produced by the query translator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamQuery {
    /// esa search term, category already folded in
    pub term: String,
    /// Page to fetch, `None` for the provider default
    pub page: Option<u32>,
    pub per_page: u32,
}

impl UpstreamQuery {
    /// Query string pairs, in the order they are sent
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sort", "number".to_string()),
            ("order", "desc".to_string()),
            ("per_page", self.per_page.to_string()),
        ];

        if !self.term.is_empty() {
            pairs.push(("q", self.term.clone()));
        }

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }

        pairs
    }
}

/// Client for a single esa team
#[derive(Clone)]
pub struct EsaClient {
    http: reqwest::Client,
    posts_url: Url,
}

impl EsaClient {
    /// # Errors
    /// Returns `AppError::Config` if `api_endpoint` cannot carry a path
    pub fn new(http: reqwest::Client, api_endpoint: &Url, team: &str) -> Result<Self, AppError> {
        let mut posts_url = api_endpoint.clone();
        posts_url
            .path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("'esa.api_endpoint' cannot be a base: {api_endpoint}"))
            })?
            .pop_if_empty()
            .extend(["v1", "teams", team, "posts"]);

        Ok(Self { http, posts_url })
    }

    pub fn posts_url(&self) -> &Url {
        &self.posts_url
    }

    /// Fetch one page of posts on behalf of the user owning `access_token`
    ///
    /// # Errors
    /// - `AppError::HttpClient` on transport failure or timeout
    /// - `AppError::Upstream` on a non-200 status (status line and raw body)
    ///   or an undecodable body
    pub async fn posts(
        &self,
        access_token: &str,
        query: &UpstreamQuery,
    ) -> Result<PostsPage, AppError> {
        tracing::debug!(term = %query.term, page = ?query.page, "Fetching esa posts");

        let response = self
            .http
            .get(self.posts_url.clone())
            .query(&query.query_pairs())
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(AppError::Upstream(format!("{status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Upstream(format!("invalid posts response: {e}")))
    }
}
