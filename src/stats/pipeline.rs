use std::collections::HashSet;

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::github::GitHubClient;
use crate::models::{Record, RepoRef};
use crate::stats::aggregator::{Aggregator, RepoStats};
use crate::storage::SkipList;

/// The sequential fetch-and-fold loop: one repository at a time, one page at
/// a time. Inaccessible repositories are recorded and skipped; anything else
/// fatal aborts the run before any output is produced.
pub struct StatsPipeline {
    github: GitHubClient,
    skip_list: SkipList,
    config: Config,
}

impl StatsPipeline {
    pub fn new(github: GitHubClient, skip_list: SkipList, config: Config) -> Self {
        Self {
            github,
            skip_list,
            config,
        }
    }

    pub async fn run(mut self) -> Result<RepoStats> {
        let repos = self.resolve_repositories().await?;
        if repos.is_empty() {
            tracing::warn!("No repositories left to process");
            return Ok(RepoStats::new());
        }

        tracing::info!("Processing {} repositories", repos.len());
        let mut aggregator = Aggregator::new(&self.config.skip_users, &self.config.skip_labels);

        let pb = ProgressBar::new(repos.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} repos")
                .unwrap()
                .progress_chars("#>-"),
        );

        for repo in repos {
            if let Err(e) = self.fetch_repo(&repo, &mut aggregator).await {
                if e.is_repo_scoped() {
                    tracing::warn!("Skipping {}: {}", repo, e);
                    self.skip_list.record(&repo)?;
                } else {
                    pb.abandon();
                    return Err(e.in_repo(&repo.to_string()));
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("Fetched all repositories");
        Ok(aggregator.into_stats())
    }

    /// Explicit repositories in config order, then organization discovery in
    /// API order; duplicates keep their first occurrence. Repositories on the
    /// durable skip list are dropped before any fetch is issued.
    async fn resolve_repositories(&self) -> Result<Vec<RepoRef>> {
        let mut repos = self.config.repositories.clone();

        if let Some(org) = &self.config.organization {
            match self.github.list_org_repos(org).await {
                Ok(discovered) => {
                    tracing::info!("Found {} repositories in {}", discovered.len(), org);
                    repos.extend(discovered);
                }
                Err(e @ Error::Auth(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Organization discovery failed for {}: {}", org, e);
                }
            }
        }

        let mut seen = HashSet::new();
        repos.retain(|repo| seen.insert(repo.clone()));

        repos.retain(|repo| {
            if self.skip_list.contains(repo) {
                tracing::info!("Skipping {} (recorded as inaccessible)", repo);
                false
            } else {
                true
            }
        });

        Ok(repos)
    }

    async fn fetch_repo(&self, repo: &RepoRef, aggregator: &mut Aggregator) -> Result<()> {
        tracing::info!("Fetching pull requests for {}", repo);
        let mut cursor =
            self.github
                .search_pull_requests(repo, self.config.start_date, self.config.end_date);

        let mut fetched = 0usize;
        while let Some(nodes) = cursor.next_page().await? {
            fetched += nodes.len();
            for node in nodes {
                for record in Record::from_node(node) {
                    aggregator.fold(repo, record);
                }
            }
        }

        tracing::info!("Processed {} pull requests from {}", fetched, repo);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;
    use chrono::NaiveDate;

    fn test_config(repositories: Vec<RepoRef>) -> Config {
        Config {
            organization: None,
            repositories,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            skip_users: Vec::new(),
            skip_labels: Vec::new(),
            metrics: Vec::new(),
            sort_by: Metric::PrCreated,
            output_file: None,
            print_to_terminal: false,
        }
    }

    #[tokio::test]
    async fn test_resolution_dedups_and_honors_skip_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut skip_list = SkipList::load(dir.path().join("skipped.txt")).unwrap();
        skip_list.record(&RepoRef::new("org", "repo2")).unwrap();

        let config = test_config(vec![
            RepoRef::new("org", "repo1"),
            RepoRef::new("org", "repo2"),
            RepoRef::new("org", "repo1"),
            RepoRef::new("org", "repo3"),
        ]);

        let pipeline = StatsPipeline::new(
            GitHubClient::new("test-token").unwrap(),
            skip_list,
            config,
        );

        // No organization configured and repo2 is on the skip list, so this
        // resolves without touching the network.
        let repos = pipeline.resolve_repositories().await.unwrap();
        assert_eq!(
            repos,
            vec![RepoRef::new("org", "repo1"), RepoRef::new("org", "repo3")]
        );
    }
}
