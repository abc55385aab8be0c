pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod report;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use github::GitHubClient;
pub use report::Reporter;
pub use stats::StatsPipeline;
pub use storage::SkipList;
