use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Metric, RepoRef};

/// The run configuration, loaded from a YAML document and validated once at
/// startup. Behavior-controlling state is immutable after this point.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub organization: Option<String>,
    #[serde(default)]
    pub repositories: Vec<RepoRef>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub skip_users: Vec<String>,
    #[serde(default = "default_skip_labels")]
    pub skip_labels: Vec<String>,
    /// Columns to report; empty selects all of them.
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default = "default_sort_by")]
    pub sort_by: Metric,
    pub output_file: Option<PathBuf>,
    #[serde(default)]
    pub print_to_terminal: bool,
}

fn default_skip_labels() -> Vec<String> {
    vec!["release".to_string()]
}

fn default_sort_by() -> Metric {
    Metric::PrCreated
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "cannot read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config: Config = serde_yaml::from_str(&content)?;

        // Skip labels match case-insensitively; normalize once here.
        for label in &mut config.skip_labels {
            *label = label.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.organization.is_none() && self.repositories.is_empty() {
            return Err(Error::Config(
                "config must supply 'repositories' and/or an 'organization'".to_string(),
            ));
        }

        if self.start_date > self.end_date {
            return Err(Error::Config(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }

        Ok(())
    }

    /// Metrics to display, in column order.
    pub fn selected_metrics(&self) -> Vec<Metric> {
        if self.metrics.is_empty() {
            Metric::ALL.to_vec()
        } else {
            self.metrics.clone()
        }
    }
}

/// The PAT never lives in the config document; it comes from the environment
/// (a `.env` file is honored by the entry point).
pub fn github_token() -> Result<String> {
    env::var("GITHUB_TOKEN")
        .map_err(|_| Error::Auth("GITHUB_TOKEN environment variable not set".to_string()))
}
