//! Domain types for forge abstraction.
//!
//! Platform-agnostic types for repositories, issues and pull requests.
//! Used by ForgeReader implementations and the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository record as returned by the forge's repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoListing {
    pub name: String,
    pub owner: String,
    pub url: String,
    pub has_issues_enabled: bool,
    pub language: Option<String>,
    pub topics: Option<Vec<String>>,
    pub description: Option<String>,
}

impl RepoListing {
    /// Listing used when the forge cannot describe a repository.
    pub fn minimal(owner: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            url: format!("https://github.com/{}/{}", owner, name),
            has_issues_enabled: true,
            language: None,
            topics: None,
            description: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Open issue. Immutable once fetched; replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub labels: Vec<String>,
    pub state: IssueState,
    pub body: String,
    pub assignee: Option<String>,
}

/// Pull request with review, merge and CI rollup state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub author: Author,
    pub state: PrState,
    pub draft: bool,
    pub labels: Vec<String>,
    pub body: String,
    pub reviewers: Option<Vec<String>>,
    pub review_decision: ReviewDecision,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub mergeable: Mergeable,
    pub checks: ChecksStatus,
}

/// PR author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    pub name: Option<String>,
}

impl Author {
    /// Full name when the forge has one, login otherwise.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.login,
        }
    }
}

/// Issue state (platform-agnostic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Pull request state (platform-agnostic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    ChangesRequested,
    ReviewRequired,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mergeable {
    Mergeable,
    Conflicting,
    Unknown,
}

/// Aggregate CI status over every check context of a PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksStatus {
    Success,
    Failure,
    Pending,
    None,
}

/// State of a single check context before reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Success,
    Failure,
    Pending,
    /// Neutral, skipped, cancelled or anything unrecognised.
    Other,
}

impl ChecksStatus {
    /// Reduce individual check contexts into one status.
    ///
    /// Any failure wins, then any pending; success only when every
    /// context succeeded. No contexts at all is `None`.
    pub fn reduce<I>(states: I) -> Self
    where
        I: IntoIterator<Item = CheckState>,
    {
        let states: Vec<CheckState> = states.into_iter().collect();
        if states.is_empty() {
            return ChecksStatus::None;
        }
        if states.contains(&CheckState::Failure) {
            ChecksStatus::Failure
        } else if states.contains(&CheckState::Pending) {
            ChecksStatus::Pending
        } else if states.iter().all(|s| *s == CheckState::Success) {
            ChecksStatus::Success
        } else {
            ChecksStatus::None
        }
    }
}

/// Minimal records for unit tests elsewhere in the crate.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn issue(number: u64) -> Issue {
        Issue {
            number,
            title: format!("issue {}", number),
            url: format!("https://github.com/acme/widget/issues/{}", number),
            labels: Vec::new(),
            state: IssueState::Open,
            body: String::new(),
            assignee: None,
        }
    }

    pub fn pull_request(number: u64) -> PullRequest {
        PullRequest {
            number,
            title: format!("pr {}", number),
            url: format!("https://github.com/acme/widget/pull/{}", number),
            author: Author {
                login: "octocat".to_string(),
                name: None,
            },
            state: PrState::Open,
            draft: false,
            labels: Vec::new(),
            body: String::new(),
            reviewers: None,
            review_decision: ReviewDecision::None,
            head_ref: None,
            base_ref: None,
            created_at: None,
            updated_at: None,
            mergeable: Mergeable::Unknown,
            checks: ChecksStatus::None,
        }
    }
}
