use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("no access to {repo}: {reason}")]
    RepoAccess { repo: String, reason: String },

    #[error("failed while fetching {repo}: {source}")]
    Fetch {
        repo: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to render report: {0}")]
    Render(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Recovered per repository (skip and continue) instead of aborting the run.
    pub fn is_repo_scoped(&self) -> bool {
        matches!(self, Error::RepoAccess { .. })
    }

    /// Attach the repository being fetched to a fatal error. Access and
    /// authentication errors already carry their own context.
    pub fn in_repo(self, repo: &str) -> Error {
        match self {
            e @ (Error::RepoAccess { .. } | Error::Auth(_)) => e,
            e => Error::Fetch {
                repo: repo.to_string(),
                source: Box::new(e),
            },
        }
    }
}
