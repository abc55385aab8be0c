use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::error::{Error, Result};
use crate::github::client::GitHubClient;
use crate::github::rate_limiter::RateLimiter;
use crate::models::{PullRequestNode, RepoRef};

/// Page-number pagination over a REST listing endpoint, terminated by the
/// `Link: rel="next"` header. Used for organization discovery.
pub struct Paginator<'a> {
    client: &'a Client,
    rate_limiter: &'a RateLimiter,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a Client, rate_limiter: &'a RateLimiter) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        base_url: &str,
        per_page: u32,
    ) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            self.rate_limiter.wait().await;

            let separator = if base_url.contains('?') { "&" } else { "?" };
            let url = format!("{}{}per_page={}&page={}", base_url, separator, per_page, page);

            tracing::debug!("Fetching: {}", url);
            let response = self.client.get(&url).send().await?;
            self.rate_limiter.observe(&response).await;

            if RateLimiter::is_rate_limited(&response) {
                let delay = RateLimiter::retry_delay(&response);
                tracing::info!("Rate limited, retrying in {:?}", delay);
                sleep(delay).await;
                continue;
            }

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Err(Error::Auth("token rejected by the GitHub API".to_string()));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::GitHubApi(format!(
                    "GET {} failed: {} - {}",
                    url, status, body
                )));
            }

            // Check for next page in Link header
            let has_next = response
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("rel=\"next\""))
                .unwrap_or(false);

            let items: Vec<T> = response.json().await?;
            let items_count = items.len();
            all_items.extend(items);

            if !has_next || items_count < per_page as usize {
                break;
            }

            page += 1;
        }

        Ok(all_items)
    }
}

/// Lazy cursor walk over the pull-request search for one repository.
///
/// Finite and not restartable: each call to [`next_page`](Self::next_page)
/// advances past the returned page, and `None` marks exhaustion.
pub struct SearchCursor<'a> {
    client: &'a GitHubClient,
    repo: RepoRef,
    search_query: String,
    cursor: Option<String>,
    done: bool,
}

impl<'a> SearchCursor<'a> {
    pub(crate) fn new(client: &'a GitHubClient, repo: RepoRef, search_query: String) -> Self {
        Self {
            client,
            repo,
            search_query,
            cursor: None,
            done: false,
        }
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Decoded nodes of the next page, or `None` once the continuation cursor
    /// is exhausted. Null search nodes are dropped here.
    pub async fn next_page(&mut self) -> Result<Option<Vec<PullRequestNode>>> {
        if self.done {
            return Ok(None);
        }

        let page = self
            .client
            .search_page(&self.repo, &self.search_query, self.cursor.as_deref())
            .await?;

        self.done = !page.page_info.has_next_page;
        self.cursor = page.page_info.end_cursor;

        Ok(Some(page.nodes.into_iter().flatten().collect()))
    }
}
