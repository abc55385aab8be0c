use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Envelope of a GraphQL response. GitHub reports partial failures through
/// `errors` while still answering 200, so both halves are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<SearchData>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    pub search: SearchPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<Option<PullRequestNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One pull request from the search, with its nested reviews, issue comments
/// and review threads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub number: u64,
    pub author: Option<Actor>,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub additions: u64,
    pub deletions: u64,
    pub labels: Connection<Label>,
    pub reviews: Connection<ReviewNode>,
    pub comments: Connection<CommentNode>,
    pub review_threads: Connection<ReviewThread>,
}

/// `{ nodes: [...] }` wrapper; individual nodes can be null.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewNode {
    pub author: Option<Actor>,
    pub state: ReviewState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    /// Dismissed, pending and anything the API adds later; not aggregated.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentNode {
    pub author: Option<Actor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewThread {
    pub comments: Connection<CommentNode>,
}
