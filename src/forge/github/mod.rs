//! GitHub ForgeReader implementation.
//!
//! "Do X": Fetch repositories, issues and PRs from GitHub.
//!
//! Uses `gh` CLI for authentication, pagination, and rate limiting.
//! All CLI interaction hidden in internal.rs.

mod internal;

use anyhow::Result;
use tracing::warn;

use super::{ForgeReader, Issue, PullRequest, RepoListing};

/// Upper bound on repositories listed per pass.
const REPO_LIMIT: usize = 1000;

/// Upper bound on issues and PRs listed per repository.
const ITEM_LIMIT: usize = 100;

/// GitHub implementation of ForgeReader.
#[derive(Debug, Clone)]
pub struct GitHubReader {
    binary: String,
}

impl GitHubReader {
    pub fn new() -> Self {
        Self {
            binary: "gh".to_string(),
        }
    }

    /// Use a specific `gh` executable instead of the one on PATH.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for GitHubReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ForgeReader for GitHubReader {
    fn list_repositories(&self, org: Option<&str>) -> Vec<RepoListing> {
        or_empty(
            "repo list",
            org.unwrap_or("@me"),
            internal::fetch_repositories(&self.binary, org, REPO_LIMIT),
        )
    }

    fn view_repository(&self, owner: &str, name: &str) -> Option<RepoListing> {
        let slug = repo_slug(owner, name);
        match internal::fetch_repository(&self.binary, &slug) {
            Ok(listing) => Some(listing),
            Err(e) => {
                warn!(repo = %slug, error = %format!("{:#}", e), "gh repo view failed");
                None
            }
        }
    }

    fn list_open_issues(&self, owner: &str, name: &str) -> Vec<Issue> {
        let slug = repo_slug(owner, name);
        or_empty(
            "issue list",
            &slug,
            internal::fetch_open_issues(&self.binary, &slug, ITEM_LIMIT),
        )
    }

    fn list_open_pull_requests(&self, owner: &str, name: &str) -> Vec<PullRequest> {
        let slug = repo_slug(owner, name);
        or_empty(
            "pr list",
            &slug,
            internal::fetch_open_pull_requests(&self.binary, &slug, ITEM_LIMIT),
        )
    }
}

/// Check if `gh` CLI is authenticated.
pub fn is_authenticated() -> Result<bool> {
    internal::check_gh_auth("gh")
}

/// Login of the authenticated `gh` user.
pub fn current_user() -> Result<String> {
    internal::fetch_current_user("gh")
}

fn repo_slug(owner: &str, name: &str) -> String {
    format!("{}/{}", owner, name)
}

fn or_empty<T>(operation: &str, subject: &str, result: Result<Vec<T>>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(
                operation,
                subject,
                error = %format!("{:#}", e),
                "gh call failed, treating as empty"
            );
            Vec::new()
        }
    }
}
