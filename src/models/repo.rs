use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A repository identifier in `owner/name` form. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The `repo:owner/name is:pr created:..` search qualifier for this
    /// repository and date range.
    pub fn search_query(&self, start: chrono::NaiveDate, end: chrono::NaiveDate) -> String {
        format!(
            "repo:{}/{} is:pr created:{}..{}",
            self.owner,
            self.name,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::Config(format!(
                "invalid repository '{}', expected owner/name",
                s
            ))),
        }
    }
}

impl TryFrom<String> for RepoRef {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RepoRef> for String {
    fn from(r: RepoRef) -> Self {
        r.to_string()
    }
}

/// Entry from the organization repository listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgRepository {
    pub full_name: String,
}
