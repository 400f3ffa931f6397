//! Forge abstraction for repository, issue and PR data.
//!
//! "Do X": Fetch what a developer's repositories look like on the forge.
//!
//! The trait is the seam between the aggregation pipeline and the platform
//! CLI. Implementations never return errors: a failed listing is an empty
//! listing, logged and forgotten until the next refresh.
//!
//! # Example
//!
//! ```no_run
//! use repodash::forge::{ForgeReader, GitHubReader};
//!
//! let reader = GitHubReader::new();
//! for repo in reader.list_repositories(None) {
//!     let issues = reader.list_open_issues(&repo.owner, &repo.name);
//!     println!("{}: {} open issues", repo.name, issues.len());
//! }
//! ```

mod types;

pub mod github;

pub use github::GitHubReader;
pub use types::*;

#[cfg(test)]
pub(crate) use types::fixtures;

/// Read-only access to forge data.
///
/// Implementations handle platform-specific CLI/API calls internally and
/// degrade every failure to "no data".
pub trait ForgeReader: Send + Sync {
    /// List repositories for the authenticated user, or for `org` when given.
    fn list_repositories(&self, org: Option<&str>) -> Vec<RepoListing>;

    /// Describe a single repository. `None` when the forge can't.
    fn view_repository(&self, owner: &str, name: &str) -> Option<RepoListing>;

    /// Open issues only; closed issues are filtered by the reader.
    fn list_open_issues(&self, owner: &str, name: &str) -> Vec<Issue>;

    /// Open pull requests with review, merge and CI rollup state.
    fn list_open_pull_requests(&self, owner: &str, name: &str) -> Vec<PullRequest>;
}
