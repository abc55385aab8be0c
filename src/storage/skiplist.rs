use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::RepoRef;

pub const DEFAULT_SKIP_LIST_PATH: &str = "skipped_repos.txt";

/// Durable record of repositories that answered 403/404 on an earlier run,
/// one `owner/name` per line. Read once at startup, append-only afterwards.
pub struct SkipList {
    path: PathBuf,
    repos: HashSet<String>,
}

impl SkipList {
    /// A missing file is an empty skip list, not an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let repos = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, repos })
    }

    pub fn contains(&self, repo: &RepoRef) -> bool {
        self.repos.contains(&repo.to_string())
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Append a repository to the file and the in-memory set. Repositories
    /// already present are not written again.
    pub fn record(&mut self, repo: &RepoRef) -> Result<()> {
        if !self.repos.insert(repo.to_string()) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", repo)?;

        Ok(())
    }
}
