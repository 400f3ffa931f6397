//! Priority ordering and flattening of repositories into a navigable feed.
//!
//! The feed is a flat list standing in for a two-level tree: each repository
//! header is followed, when expanded, by its pull requests, then its issues,
//! or a single disabled placeholder when it has neither.
//!
//! Positions shift on every rebuild, so rows are addressed by [`EntryId`].
//! Callers holding a selection re-resolve it with [`position_of`] after each
//! rebuild and fall back to the first row when it is gone.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::quality::GateStatus;
use crate::summary::RepositorySummary;

/// Identity of one feed row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryId {
    RepoHeader { repo: String },
    PullRequest { repo: String, number: u64 },
    Issue { repo: String, number: u64 },
    Empty { repo: String },
}

impl EntryId {
    pub fn header(repo: impl Into<String>) -> Self {
        EntryId::RepoHeader { repo: repo.into() }
    }

    /// Repository the row belongs to
    pub fn repo(&self) -> &str {
        match self {
            EntryId::RepoHeader { repo }
            | EntryId::PullRequest { repo, .. }
            | EntryId::Issue { repo, .. }
            | EntryId::Empty { repo } => repo,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, EntryId::RepoHeader { .. })
    }
}

/// One row of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub id: EntryId,
    /// Disabled rows can't be selected
    pub disabled: bool,
    /// Repository description, carried by the empty placeholder only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FeedEntry {
    fn row(id: EntryId) -> Self {
        Self {
            id,
            disabled: false,
            description: None,
        }
    }
}

// =============================================================================
// Views and priorities
// =============================================================================

/// Ordering of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortView {
    /// Failing gates first, then issue count; rows expand inline
    #[default]
    Attention,
    /// Weighs local work and PRs; headers only, laid out as a grid
    Activity,
}

impl SortView {
    pub fn priority(self, repo: &RepositorySummary) -> u64 {
        match self {
            SortView::Attention => attention_priority(repo),
            SortView::Activity => activity_priority(repo),
        }
    }

    /// Whether expanded repositories show their child rows
    pub fn shows_children(self) -> bool {
        matches!(self, SortView::Attention)
    }
}

impl fmt::Display for SortView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortView::Attention => write!(f, "attention"),
            SortView::Activity => write!(f, "activity"),
        }
    }
}

impl FromStr for SortView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "attention" | "list" => Ok(SortView::Attention),
            "activity" | "grid" => Ok(SortView::Activity),
            other => Err(format!(
                "unknown view '{}' (expected attention or activity)",
                other
            )),
        }
    }
}

/// 1000 for a failing gate, 100 for a warning, plus the open issue count
pub fn attention_priority(repo: &RepositorySummary) -> u64 {
    let gate = match repo.gate() {
        Some(GateStatus::Error) => 1000,
        Some(GateStatus::Warn) => 100,
        _ => 0,
    };
    gate + repo.open_issues_count as u64
}

/// Failing gate 1000, uncommitted work 500, ten per issue and per PR,
/// 100 for a local clone
pub fn activity_priority(repo: &RepositorySummary) -> u64 {
    let mut priority = 0;
    if repo.gate() == Some(GateStatus::Error) {
        priority += 1000;
    }
    if repo.has_uncommitted_changes {
        priority += 500;
    }
    priority += repo.open_issues_count as u64 * 10;
    priority += repo.pr_count() as u64 * 10;
    if repo.local_path.is_some() {
        priority += 100;
    }
    priority
}

/// Repositories in descending priority; ties keep input order.
pub fn sort_repositories(repos: &[RepositorySummary], view: SortView) -> Vec<&RepositorySummary> {
    let mut sorted: Vec<&RepositorySummary> = repos.iter().collect();
    sorted.sort_by_key(|r| Reverse(view.priority(r)));
    sorted
}

// =============================================================================
// Flattening
// =============================================================================

/// Attention-ordered feed with inline children for expanded repositories.
pub fn build(repos: &[RepositorySummary], expanded: &HashSet<String>) -> Vec<FeedEntry> {
    build_with(repos, expanded, SortView::Attention)
}

/// Feed for a given view. Views without inline children ignore `expanded`.
pub fn build_with(
    repos: &[RepositorySummary],
    expanded: &HashSet<String>,
    view: SortView,
) -> Vec<FeedEntry> {
    let mut feed = Vec::with_capacity(repos.len());

    for repo in sort_repositories(repos, view) {
        feed.push(FeedEntry::row(EntryId::header(&repo.name)));

        if view.shows_children() && expanded.contains(&repo.name) {
            push_children(&mut feed, repo);
        }
    }

    feed
}

fn push_children(feed: &mut Vec<FeedEntry>, repo: &RepositorySummary) {
    let pull_requests = repo.pull_requests.as_deref().unwrap_or_default();

    for pr in pull_requests {
        feed.push(FeedEntry::row(EntryId::PullRequest {
            repo: repo.name.clone(),
            number: pr.number,
        }));
    }
    for issue in &repo.issues {
        feed.push(FeedEntry::row(EntryId::Issue {
            repo: repo.name.clone(),
            number: issue.number,
        }));
    }

    if pull_requests.is_empty() && repo.issues.is_empty() {
        feed.push(FeedEntry {
            id: EntryId::Empty {
                repo: repo.name.clone(),
            },
            disabled: true,
            description: repo.description.clone(),
        });
    }
}

/// Current position of an identity, if it is still in the feed
pub fn position_of(feed: &[FeedEntry], id: &EntryId) -> Option<usize> {
    feed.iter().position(|entry| &entry.id == id)
}

/// Position of an identity, falling back to the first row
pub fn resolve(feed: &[FeedEntry], id: &EntryId) -> usize {
    position_of(feed, id).unwrap_or(0)
}
