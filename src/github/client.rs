use chrono::NaiveDate;
use reqwest::{header, Client, StatusCode};
use tokio::time::sleep;

use crate::error::{Error, Result};
use crate::github::paginator::{Paginator, SearchCursor};
use crate::github::rate_limiter::RateLimiter;
use crate::models::{GraphQlResponse, OrgRepository, RepoRef, SearchPage};

/// One search page of 20 keeps the nested review/comment fan-out under the
/// GraphQL node complexity limit.
const SEARCH_PAGE_SIZE: u32 = 20;

const SEARCH_QUERY: &str = r#"
query($searchQuery: String!, $first: Int!, $after: String) {
  search(query: $searchQuery, type: ISSUE, first: $first, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      ... on PullRequest {
        number
        createdAt
        mergedAt
        author { login }
        additions
        deletions
        labels(first: 20) {
          nodes { name }
        }
        reviews(first: 50) {
          nodes {
            author { login }
            state
          }
        }
        comments(first: 50) {
          nodes { author { login } }
        }
        reviewThreads(first: 50) {
          nodes {
            comments(first: 50) {
              nodes { author { login } }
            }
          }
        }
      }
    }
  }
}
"#;

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("ghstats/0.1"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: "https://api.github.com".to_string(),
        })
    }

    /// All repositories of an organization, in API order.
    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<RepoRef>> {
        let url = format!("{}/orgs/{}/repos", self.base_url, org);
        let paginator = Paginator::new(&self.client, &self.rate_limiter);
        tracing::info!("Discovering repositories for organization: {}", org);

        let repos: Vec<OrgRepository> = paginator.fetch_all(&url, 100).await?;
        repos.into_iter().map(|r| r.full_name.parse()).collect()
    }

    /// Lazy page sequence over the pull requests of one repository created in
    /// the date range, with nested reviews and comments.
    pub fn search_pull_requests(
        &self,
        repo: &RepoRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SearchCursor<'_> {
        SearchCursor::new(self, repo.clone(), repo.search_query(start, end))
    }

    /// One search page. Retries rate-limit responses for as long as the
    /// service keeps answering; transport failures propagate and abort.
    pub(crate) async fn search_page(
        &self,
        repo: &RepoRef,
        search_query: &str,
        after: Option<&str>,
    ) -> Result<SearchPage> {
        let payload = serde_json::json!({
            "query": SEARCH_QUERY,
            "variables": {
                "searchQuery": search_query,
                "first": SEARCH_PAGE_SIZE,
                "after": after,
            },
        });

        loop {
            self.rate_limiter.wait().await;

            tracing::debug!("Searching {} after {:?}", repo, after);
            let response = self
                .client
                .post(format!("{}/graphql", self.base_url))
                .json(&payload)
                .send()
                .await?;
            self.rate_limiter.observe(&response).await;

            if RateLimiter::is_rate_limited(&response) {
                let delay = RateLimiter::retry_delay(&response);
                tracing::info!("Rate limited on {}, retrying in {:?}", repo, delay);
                sleep(delay).await;
                continue;
            }

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Err(Error::Auth("token rejected by the GitHub API".to_string()));
            }
            if status == StatusCode::FORBIDDEN || status == StatusCode::NOT_FOUND {
                return Err(Error::RepoAccess {
                    repo: repo.to_string(),
                    reason: format!("HTTP {}", status),
                });
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::GitHubApi(format!(
                    "search failed for {}: {} - {}",
                    repo, status, body
                )));
            }

            let decoded: GraphQlResponse = response.json().await?;

            if !decoded.errors.is_empty() {
                if decoded.errors.iter().any(is_rate_limit_error) {
                    let delay = self.rate_limiter.delay_until_reset().await;
                    tracing::info!("Search rate limited on {}, retrying in {:?}", repo, delay);
                    sleep(delay).await;
                    continue;
                }

                if let Some(denied) = decoded
                    .errors
                    .iter()
                    .find(|e| matches!(e.kind.as_deref(), Some("NOT_FOUND") | Some("FORBIDDEN")))
                {
                    return Err(Error::RepoAccess {
                        repo: repo.to_string(),
                        reason: denied.message.clone(),
                    });
                }

                return Err(Error::GitHubApi(format!(
                    "GraphQL error for {}: {}",
                    repo, decoded.errors[0].message
                )));
            }

            return match decoded.data {
                Some(data) => Ok(data.search),
                None => Err(Error::GitHubApi(format!(
                    "empty GraphQL response for {}",
                    repo
                ))),
            };
        }
    }
}

fn is_rate_limit_error(error: &crate::models::GraphQlError) -> bool {
    error.kind.as_deref() == Some("RATE_LIMITED")
        || error.message.contains("API rate limit exceeded")
}
