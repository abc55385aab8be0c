use std::collections::{BTreeMap, HashSet};

use crate::models::{Metric, Record, RepoRef, ReviewState};

/// Per-user running totals, created lazily on a user's first contribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub prs_created: u64,
    pub reviews_approved: u64,
    pub reviews_changes_requested: u64,
    pub reviews_commented: u64,
    pub comments: u64,
    /// additions + deletions over pull requests without a skip label.
    pub lines_changed: u64,
    pub sized_prs: u64,
    /// Creation-to-merge latency in hours over merged, non-skip-labeled PRs.
    pub merge_time_hours: f64,
    pub merged_prs: u64,
}

impl UserStats {
    pub fn avg_pr_size(&self) -> Option<f64> {
        (self.sized_prs > 0).then(|| self.lines_changed as f64 / self.sized_prs as f64)
    }

    pub fn avg_merge_time(&self) -> Option<f64> {
        (self.merged_prs > 0).then(|| self.merge_time_hours / self.merged_prs as f64)
    }

    /// Value of one metric for sorting and rendering. Averages are undefined
    /// (`None`) until their divisor is non-zero.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::PrCreated => Some(self.prs_created as f64),
            Metric::ReviewsApproved => Some(self.reviews_approved as f64),
            Metric::ReviewsChangesRequested => Some(self.reviews_changes_requested as f64),
            Metric::ReviewsCommented => Some(self.reviews_commented as f64),
            Metric::Comments => Some(self.comments as f64),
            Metric::AvgPrSize => self.avg_pr_size(),
            Metric::AvgMergeTime => self.avg_merge_time(),
        }
    }
}

/// Aggregated totals: repository → login → stats. `BTreeMap` on both levels
/// keeps iteration deterministic for the report.
pub type RepoStats = BTreeMap<RepoRef, BTreeMap<String, UserStats>>;

pub struct Aggregator {
    skip_users: HashSet<String>,
    skip_labels: Vec<String>,
    repos: RepoStats,
}

impl Aggregator {
    pub fn new(skip_users: &[String], skip_labels: &[String]) -> Self {
        Self {
            skip_users: skip_users.iter().cloned().collect(),
            skip_labels: skip_labels.to_vec(),
            repos: RepoStats::new(),
        }
    }

    /// Fold one record into its author's accumulator. Records by skipped or
    /// bot authors are dropped whole.
    pub fn fold(&mut self, repo: &RepoRef, record: Record) {
        let author = record.author().to_string();
        if self.is_skipped(&author) {
            return;
        }

        match record {
            Record::PullRequest(pr) => {
                // Skip-labeled PRs still count as created, but stay out of
                // the size and merge-time totals and their divisors.
                let counts_size = !self.has_skip_label(&pr.labels);
                let stats = self.user_entry(repo, &author);
                stats.prs_created += 1;
                if counts_size {
                    stats.lines_changed += pr.additions + pr.deletions;
                    stats.sized_prs += 1;
                    if let Some(merged_at) = pr.merged_at {
                        stats.merge_time_hours +=
                            (merged_at - pr.created_at).num_seconds() as f64 / 3600.0;
                        stats.merged_prs += 1;
                    }
                }
            }
            Record::Review(review) => match review.state {
                ReviewState::Approved => self.user_entry(repo, &author).reviews_approved += 1,
                ReviewState::ChangesRequested => {
                    self.user_entry(repo, &author).reviews_changes_requested += 1
                }
                ReviewState::Commented => self.user_entry(repo, &author).reviews_commented += 1,
                ReviewState::Other => {}
            },
            Record::Comment(_) => {
                self.user_entry(repo, &author).comments += 1;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn into_stats(self) -> RepoStats {
        self.repos
    }

    fn is_skipped(&self, login: &str) -> bool {
        self.skip_users.contains(login) || login.ends_with("[bot]")
    }

    fn has_skip_label(&self, labels: &[String]) -> bool {
        labels
            .iter()
            .any(|label| self.skip_labels.iter().any(|s| label.eq_ignore_ascii_case(s)))
    }

    fn user_entry(&mut self, repo: &RepoRef, login: &str) -> &mut UserStats {
        self.repos
            .entry(repo.clone())
            .or_default()
            .entry(login.to_string())
            .or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentRecord, PullRequestRecord, ReviewRecord};
    use chrono::{Duration, TimeZone, Utc};

    fn pr(author: &str, additions: u64, deletions: u64, labels: &[&str]) -> Record {
        Record::PullRequest(PullRequestRecord {
            author: author.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
            merged_at: None,
            additions,
            deletions,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        })
    }

    fn merged_pr(author: &str, hours: i64, labels: &[&str]) -> Record {
        let created_at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        Record::PullRequest(PullRequestRecord {
            author: author.to_string(),
            created_at,
            merged_at: Some(created_at + Duration::hours(hours)),
            additions: 1,
            deletions: 1,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        })
    }

    fn review(author: &str, state: ReviewState) -> Record {
        Record::Review(ReviewRecord {
            author: author.to_string(),
            state,
        })
    }

    fn repo1() -> RepoRef {
        RepoRef::new("org", "repo1")
    }

    #[test]
    fn test_skip_labeled_pr_counts_but_has_no_size() {
        let mut agg = Aggregator::new(&[], &["release".to_string()]);
        agg.fold(&repo1(), pr("alice", 10, 5, &["release"]));
        agg.fold(&repo1(), pr("alice", 20, 10, &[]));

        let repos = agg.into_stats();
        let stats = &repos[&repo1()]["alice"];
        assert_eq!(stats.prs_created, 2);
        assert_eq!(stats.lines_changed, 30);
        assert_eq!(stats.sized_prs, 1);
        assert_eq!(stats.avg_pr_size(), Some(30.0));
    }

    #[test]
    fn test_skip_label_matches_case_insensitively() {
        let mut agg = Aggregator::new(&[], &["release".to_string()]);
        agg.fold(&repo1(), pr("alice", 10, 5, &["Release"]));

        let repos = agg.into_stats();
        let stats = &repos[&repo1()]["alice"];
        assert_eq!(stats.prs_created, 1);
        assert_eq!(stats.sized_prs, 0);
    }

    #[test]
    fn test_skipped_users_and_bots_never_appear() {
        let mut agg = Aggregator::new(&["eve".to_string()], &[]);
        agg.fold(&repo1(), pr("eve", 10, 5, &[]));
        agg.fold(&repo1(), pr("dependabot[bot]", 3, 1, &[]));
        agg.fold(&repo1(), review("eve", ReviewState::Approved));
        agg.fold(
            &repo1(),
            Record::Comment(CommentRecord {
                author: "renovate[bot]".to_string(),
            }),
        );

        assert!(agg.is_empty());
    }

    #[test]
    fn test_review_outcomes_are_keyed_separately() {
        let mut agg = Aggregator::new(&[], &[]);
        agg.fold(&repo1(), review("bob", ReviewState::Approved));
        agg.fold(&repo1(), review("bob", ReviewState::Approved));
        agg.fold(&repo1(), review("bob", ReviewState::ChangesRequested));
        agg.fold(&repo1(), review("bob", ReviewState::Commented));
        agg.fold(&repo1(), review("bob", ReviewState::Other));

        let repos = agg.into_stats();
        let stats = &repos[&repo1()]["bob"];
        assert_eq!(stats.reviews_approved, 2);
        assert_eq!(stats.reviews_changes_requested, 1);
        assert_eq!(stats.reviews_commented, 1);
    }

    #[test]
    fn test_merge_time_only_for_merged_unlabeled_prs() {
        let mut agg = Aggregator::new(&[], &["release".to_string()]);
        agg.fold(&repo1(), merged_pr("alice", 24, &[]));
        agg.fold(&repo1(), merged_pr("alice", 48, &[]));
        agg.fold(&repo1(), merged_pr("alice", 100, &["release"]));
        agg.fold(&repo1(), pr("alice", 5, 5, &[]));

        let repos = agg.into_stats();
        let stats = &repos[&repo1()]["alice"];
        assert_eq!(stats.merged_prs, 2);
        assert_eq!(stats.avg_merge_time(), Some(36.0));
    }

    #[test]
    fn test_avg_merge_time_undefined_without_merges() {
        let mut agg = Aggregator::new(&[], &[]);
        agg.fold(&repo1(), pr("alice", 10, 5, &[]));

        let repos = agg.into_stats();
        let stats = &repos[&repo1()]["alice"];
        assert_eq!(stats.avg_merge_time(), None);
        assert_eq!(stats.metric(Metric::AvgMergeTime), None);
    }

    #[test]
    fn test_pr_created_sum_matches_folded_prs() {
        let mut agg = Aggregator::new(&["eve".to_string()], &[]);
        let authors = ["alice", "bob", "alice", "eve", "carol"];
        for author in authors {
            agg.fold(&repo1(), pr(author, 1, 1, &[]));
        }

        let total: u64 = agg.into_stats()[&repo1()]
            .values()
            .map(|s| s.prs_created)
            .sum();
        // five folded, one by a skipped user
        assert_eq!(total, 4);
    }

    #[test]
    fn test_comments_count_across_sources() {
        let mut agg = Aggregator::new(&[], &[]);
        for _ in 0..3 {
            agg.fold(
                &repo1(),
                Record::Comment(CommentRecord {
                    author: "carol".to_string(),
                }),
            );
        }

        let repos = agg.into_stats();
        let stats = &repos[&repo1()]["carol"];
        assert_eq!(stats.comments, 3);
    }
}
