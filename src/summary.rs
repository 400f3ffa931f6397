//! Per-repository summary produced by each aggregation pass.
//!
//! Summaries are created fresh on every pass and replace prior ones
//! wholesale. The only carried-over state is the quality gate result, and
//! only through [`merge_preserving_quality_status`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::forge::{Issue, PullRequest, RepoListing};
use crate::quality::{GateStatus, QualityGateStatus};

/// Topics that mark a repository's cloud environment.
pub const CLOUD_TOPICS: &[&str] = &[
    "aws",
    "azure",
    "gcp",
    "cloudflare",
    "vercel",
    "heroku",
    "digitalocean",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub owner: String,
    pub url: String,
    pub language: Option<String>,
    pub topics: Option<Vec<String>>,
    pub description: Option<String>,
    /// Absent when the repository isn't cloned under the local code path.
    pub local_path: Option<PathBuf>,
    pub has_uncommitted_changes: bool,
    pub current_branch: Option<String>,
    pub open_issues_count: usize,
    pub issues: Vec<Issue>,
    /// `None` means not fetched this pass.
    pub pull_requests: Option<Vec<PullRequest>>,
    pub sonar_status: Option<QualityGateStatus>,
    /// Distinguishes "checked, nothing found" from "never checked".
    pub sonar_checked: bool,
    pub details_loaded: bool,
}

impl RepositorySummary {
    /// Summary for a listing with nothing fetched yet.
    pub fn from_listing(listing: &RepoListing) -> Self {
        Self {
            name: listing.name.clone(),
            owner: listing.owner.clone(),
            url: listing.url.clone(),
            language: listing.language.clone(),
            topics: listing.topics.clone(),
            description: listing.description.clone(),
            local_path: None,
            has_uncommitted_changes: false,
            current_branch: None,
            open_issues_count: 0,
            issues: Vec::new(),
            pull_requests: None,
            sonar_status: None,
            sonar_checked: false,
            details_loaded: false,
        }
    }

    /// Replace the issue list, keeping the count in step.
    pub fn set_issues(&mut self, issues: Vec<Issue>) {
        self.open_issues_count = issues.len();
        self.issues = issues;
    }

    /// First topic naming a known cloud provider, lowercased.
    pub fn cloud_env(&self) -> Option<String> {
        self.topics.as_ref()?.iter().find_map(|topic| {
            let lower = topic.to_lowercase();
            CLOUD_TOPICS.contains(&lower.as_str()).then_some(lower)
        })
    }

    pub fn pr_count(&self) -> usize {
        self.pull_requests.as_ref().map_or(0, Vec::len)
    }

    pub fn gate(&self) -> Option<GateStatus> {
        self.sonar_status.as_ref().map(|s| s.status)
    }

    pub fn find_issue(&self, number: u64) -> Option<&Issue> {
        self.issues.iter().find(|i| i.number == number)
    }

    pub fn find_pull_request(&self, number: u64) -> Option<&PullRequest> {
        self.pull_requests
            .as_ref()?
            .iter()
            .find(|pr| pr.number == number)
    }
}

/// Carry quality gate results from `old` into a fresh pass that didn't check.
///
/// Matching is by repository name. A new summary that was itself checked
/// keeps its own result; an old summary that was never checked has nothing
/// to carry.
pub fn merge_preserving_quality_status(
    old: &[RepositorySummary],
    new: Vec<RepositorySummary>,
) -> Vec<RepositorySummary> {
    let known: HashMap<&str, &RepositorySummary> = old
        .iter()
        .filter(|r| r.sonar_checked)
        .map(|r| (r.name.as_str(), r))
        .collect();

    new.into_iter()
        .map(|mut summary| {
            if !summary.sonar_checked {
                if let Some(previous) = known.get(summary.name.as_str()) {
                    summary.sonar_status = previous.sonar_status.clone();
                    summary.sonar_checked = true;
                }
            }
            summary
        })
        .collect()
}

/// Swap one refreshed summary into the collection by name.
///
/// Returns false (and leaves the collection untouched) when no summary has
/// that name.
pub fn replace_summary(repos: &mut [RepositorySummary], updated: RepositorySummary) -> bool {
    match repos.iter_mut().find(|r| r.name == updated.name) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str) -> RepositorySummary {
        RepositorySummary::from_listing(&RepoListing::minimal("acme", name))
    }

    fn gate(status: GateStatus) -> QualityGateStatus {
        QualityGateStatus {
            project_key: "k".to_string(),
            status,
            url: String::new(),
            conditions: Vec::new(),
        }
    }

    #[test]
    fn test_cloud_env_matches_known_topic() {
        let mut repo = summary("infra");
        repo.topics = Some(vec!["terraform".to_string(), "AWS".to_string()]);
        assert_eq!(repo.cloud_env().as_deref(), Some("aws"));

        repo.topics = Some(vec!["terraform".to_string()]);
        assert!(repo.cloud_env().is_none());

        repo.topics = None;
        assert!(repo.cloud_env().is_none());
    }

    #[test]
    fn test_set_issues_keeps_count() {
        let mut repo = summary("widget");
        repo.set_issues(vec![Issue {
            number: 1,
            title: "t".to_string(),
            url: String::new(),
            labels: Vec::new(),
            state: crate::forge::IssueState::Open,
            body: String::new(),
            assignee: None,
        }]);
        assert_eq!(repo.open_issues_count, 1);
        assert_eq!(repo.open_issues_count, repo.issues.len());
    }

    #[test]
    fn test_merge_carries_checked_status() {
        let mut old_a = summary("a");
        old_a.sonar_checked = true;
        old_a.sonar_status = Some(gate(GateStatus::Error));
        let mut old_b = summary("b");
        old_b.sonar_checked = true;
        let old_c = summary("c");

        let merged = merge_preserving_quality_status(
            &[old_a, old_b, old_c],
            vec![summary("a"), summary("b"), summary("c"), summary("d")],
        );

        assert!(merged[0].sonar_checked);
        assert_eq!(merged[0].gate(), Some(GateStatus::Error));
        // checked, nothing found: still distinguishable from never checked
        assert!(merged[1].sonar_checked);
        assert!(merged[1].sonar_status.is_none());
        assert!(!merged[2].sonar_checked);
        assert!(!merged[3].sonar_checked);
    }

    #[test]
    fn test_merge_keeps_fresh_check() {
        let mut old = summary("a");
        old.sonar_checked = true;
        old.sonar_status = Some(gate(GateStatus::Error));

        let mut fresh = summary("a");
        fresh.sonar_checked = true;
        fresh.sonar_status = Some(gate(GateStatus::Ok));

        let merged = merge_preserving_quality_status(&[old], vec![fresh]);
        assert_eq!(merged[0].gate(), Some(GateStatus::Ok));
    }

    #[test]
    fn test_replace_summary_by_name() {
        let mut repos = vec![summary("a"), summary("b")];
        let mut updated = summary("b");
        updated.open_issues_count = 4;

        assert!(replace_summary(&mut repos, updated));
        assert_eq!(repos[1].open_issues_count, 4);
        assert!(!replace_summary(&mut repos, summary("zzz")));
        assert_eq!(repos.len(), 2);
    }
}
