pub mod markdown;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::models::Metric;
use crate::stats::{RepoStats, UserStats};

/// One report row: a login and its values aligned with the selected metrics.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) login: String,
    pub(crate) values: Vec<Option<f64>>,
}

/// Sorts, formats and emits the aggregated tables. No retries, no side
/// effects beyond writing the output.
pub struct Reporter {
    metrics: Vec<Metric>,
    sort_by: Metric,
    output_file: Option<PathBuf>,
    print_to_terminal: bool,
}

impl Reporter {
    pub fn new(config: &Config) -> Self {
        Self {
            metrics: config.selected_metrics(),
            sort_by: config.sort_by,
            output_file: config.output_file.clone(),
            print_to_terminal: config.print_to_terminal,
        }
    }

    pub fn generate(&self, stats: &RepoStats) -> Result<()> {
        let mut sections = Vec::new();

        for (repo, users) in stats {
            let rows = self.build_rows(users);
            if rows.is_empty() {
                continue;
            }
            sections.push(format!(
                "\nStats for {}:\n{}\n",
                repo,
                markdown::render_table(&self.metrics, &rows)?
            ));
        }

        let output = if sections.is_empty() {
            "No data found.".to_string()
        } else {
            sections.join("\n")
        };

        if self.print_to_terminal {
            println!("{}", output);
        }

        if let Some(path) = &self.output_file {
            std::fs::write(path, &output)?;
            tracing::info!("Report saved to {}", path.display());
        }

        Ok(())
    }

    /// Rows with at least one non-blank, non-zero selected value, sorted by
    /// the configured metric descending. `BTreeMap` iteration is
    /// login-ascending and the sort is stable, so that is the tie-break.
    fn build_rows(&self, users: &BTreeMap<String, UserStats>) -> Vec<Row> {
        let mut rows: Vec<Row> = users
            .iter()
            .map(|(login, stats)| Row {
                login: login.clone(),
                values: self.metrics.iter().map(|m| stats.metric(*m)).collect(),
            })
            .filter(|row| row.values.iter().any(|v| v.is_some_and(|v| v != 0.0)))
            .collect();

        // Fall back to the first column when the sort key is not displayed.
        let sort_idx = self
            .metrics
            .iter()
            .position(|m| *m == self.sort_by)
            .unwrap_or(0);

        rows.sort_by(|a, b| {
            let a = a.values[sort_idx].unwrap_or(f64::NEG_INFINITY);
            let b = b.values[sort_idx].unwrap_or(f64::NEG_INFINITY);
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepoRef;
    use chrono::NaiveDate;

    fn test_config(metrics: Vec<Metric>, sort_by: Metric) -> Config {
        Config {
            organization: None,
            repositories: vec![RepoRef::new("org", "repo1")],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            skip_users: Vec::new(),
            skip_labels: Vec::new(),
            metrics,
            sort_by,
            output_file: None,
            print_to_terminal: false,
        }
    }

    fn user(prs: u64, comments: u64) -> UserStats {
        UserStats {
            prs_created: prs,
            comments,
            ..Default::default()
        }
    }

    fn one_repo(users: Vec<(&str, UserStats)>) -> RepoStats {
        let mut stats = RepoStats::new();
        stats.insert(
            RepoRef::new("org", "repo1"),
            users
                .into_iter()
                .map(|(login, stats)| (login.to_string(), stats))
                .collect(),
        );
        stats
    }

    #[test]
    fn test_rows_sorted_descending_with_login_tiebreak() {
        let reporter = Reporter::new(&test_config(Vec::new(), Metric::PrCreated));
        let stats = one_repo(vec![
            ("carol", user(2, 0)),
            ("bob", user(5, 0)),
            ("dave", user(2, 0)),
            ("alice", user(2, 0)),
        ]);

        let rows = reporter.build_rows(&stats[&RepoRef::new("org", "repo1")]);
        let logins: Vec<_> = rows.iter().map(|r| r.login.as_str()).collect();
        assert_eq!(logins, vec!["bob", "alice", "carol", "dave"]);
    }

    #[test]
    fn test_all_zero_rows_are_dropped() {
        let reporter = Reporter::new(&test_config(vec![Metric::Comments], Metric::Comments));
        let stats = one_repo(vec![("alice", user(4, 0)), ("bob", user(0, 2))]);

        let rows = reporter.build_rows(&stats[&RepoRef::new("org", "repo1")]);
        // alice has PRs but no comments, and only comments are displayed
        let logins: Vec<_> = rows.iter().map(|r| r.login.as_str()).collect();
        assert_eq!(logins, vec!["bob"]);
    }

    #[test]
    fn test_undefined_average_renders_blank() {
        let reporter = Reporter::new(&test_config(Vec::new(), Metric::PrCreated));
        let stats = one_repo(vec![("alice", user(1, 0))]);

        let rows = reporter.build_rows(&stats[&RepoRef::new("org", "repo1")]);
        let table = markdown::render_table(&Metric::ALL, &rows).unwrap();

        assert!(table.contains("alice"));
        assert!(
            !table.contains("NaN") && !table.contains("inf"),
            "undefined averages must stay blank:\n{table}"
        );
    }

    #[test]
    fn test_generate_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        let mut config = test_config(Vec::new(), Metric::PrCreated);
        config.output_file = Some(path.clone());
        let reporter = Reporter::new(&config);

        reporter
            .generate(&one_repo(vec![("alice", user(2, 1))]))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Stats for org/repo1:"));
        assert!(content.contains("alice"));
    }

    #[test]
    fn test_generate_empty_stats_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        let mut config = test_config(Vec::new(), Metric::PrCreated);
        config.output_file = Some(path.clone());
        Reporter::new(&config).generate(&RepoStats::new()).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "No data found.");
    }
}
