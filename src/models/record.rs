use chrono::{DateTime, Utc};

use super::pull_request::{PullRequestNode, ReviewState};

/// A flattened unit of activity, folded one at a time by the aggregator.
#[derive(Debug, Clone)]
pub enum Record {
    PullRequest(PullRequestRecord),
    Review(ReviewRecord),
    Comment(CommentRecord),
}

#[derive(Debug, Clone)]
pub struct PullRequestRecord {
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub additions: u64,
    pub deletions: u64,
    /// Lowercased label names, matched case-insensitively against skip labels.
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub author: String,
    pub state: ReviewState,
}

#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub author: String,
}

impl Record {
    pub fn author(&self) -> &str {
        match self {
            Record::PullRequest(pr) => &pr.author,
            Record::Review(review) => &review.author,
            Record::Comment(comment) => &comment.author,
        }
    }

    /// Flatten one search node into records. Reviews and comments by deleted
    /// accounts carry no author and are dropped; an authorless pull request
    /// folds under the login `unknown`.
    pub fn from_node(node: PullRequestNode) -> Vec<Record> {
        let mut records = Vec::new();

        let author = node
            .author
            .as_ref()
            .map(|a| a.login.clone())
            .unwrap_or_else(|| "unknown".to_string());

        records.push(Record::PullRequest(PullRequestRecord {
            author,
            created_at: node.created_at,
            merged_at: node.merged_at,
            additions: node.additions,
            deletions: node.deletions,
            labels: node
                .labels
                .into_nodes()
                .map(|l| l.name.to_lowercase())
                .collect(),
        }));

        for review in node.reviews.into_nodes() {
            if let Some(author) = review.author {
                records.push(Record::Review(ReviewRecord {
                    author: author.login,
                    state: review.state,
                }));
            }
        }

        for comment in node.comments.into_nodes() {
            if let Some(author) = comment.author {
                records.push(Record::Comment(CommentRecord {
                    author: author.login,
                }));
            }
        }

        for thread in node.review_threads.into_nodes() {
            for comment in thread.comments.into_nodes() {
                if let Some(author) = comment.author {
                    records.push(Record::Comment(CommentRecord {
                        author: author.login,
                    }));
                }
            }
        }

        records
    }
}
