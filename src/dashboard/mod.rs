//! Dashboard state - the single owner of the in-memory repository list
//!
//! "Do X": Keep summaries, expansion, view and selection consistent.
//!
//! Every mutation rebuilds the feed and re-resolves the selected
//! [`EntryId`]; the cursor position is never carried across a rebuild.
//! Aggregation results come in through the `apply_*` methods, which take
//! care of quality-gate carry-over.

mod refresh;

pub use refresh::{RefreshGate, RefreshPermit};

use std::collections::HashSet;

use crate::feed::{self, EntryId, FeedEntry, SortView};
use crate::forge::{Issue, PullRequest};
use crate::summary::{self, RepositorySummary};

/// Cards per row in the activity grid
pub const GRID_COLUMNS: usize = 3;

/// What a detail pane should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTarget<'a> {
    Issue {
        repo: &'a RepositorySummary,
        index: usize,
    },
    PullRequest {
        repo: &'a RepositorySummary,
        index: usize,
    },
}

#[derive(Debug, Default)]
pub struct Dashboard {
    repos: Vec<RepositorySummary>,
    expanded: HashSet<String>,
    view: SortView,
    feed: Vec<FeedEntry>,
    cursor: usize,
    selected: Option<EntryId>,
    status: Option<String>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(view: SortView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn repos(&self) -> &[RepositorySummary] {
        &self.repos
    }

    pub fn feed(&self) -> &[FeedEntry] {
        &self.feed
    }

    pub fn view(&self) -> SortView {
        self.view
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_id(&self) -> Option<&EntryId> {
        self.selected.as_ref()
    }

    pub fn is_expanded(&self, repo: &str) -> bool {
        self.expanded.contains(repo)
    }

    pub fn total_issues(&self) -> usize {
        self.repos.iter().map(|r| r.open_issues_count).sum()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// `Repos: N | Issues: M`, plus the last status message
    pub fn status_line(&self) -> String {
        let counts = format!(
            "Repos: {} | Issues: {}",
            self.repos.len(),
            self.total_issues()
        );
        match &self.status {
            Some(message) => format!("{} | {}", counts, message),
            None => counts,
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_repo(&self) -> Option<&RepositorySummary> {
        let id = self.selected.as_ref()?;
        self.find_repo(id.repo())
    }

    pub fn selected_issue(&self) -> Option<(&RepositorySummary, &Issue)> {
        match self.selected.as_ref()? {
            EntryId::Issue { repo, number } => {
                let repo = self.find_repo(repo)?;
                Some((repo, repo.find_issue(*number)?))
            }
            _ => None,
        }
    }

    pub fn selected_pr(&self) -> Option<(&RepositorySummary, &PullRequest)> {
        match self.selected.as_ref()? {
            EntryId::PullRequest { repo, number } => {
                let repo = self.find_repo(repo)?;
                Some((repo, repo.find_pull_request(*number)?))
            }
            _ => None,
        }
    }

    /// URL for the selected row: PR, then issue, then repository
    pub fn selected_url(&self) -> Option<&str> {
        if let Some((_, pr)) = self.selected_pr() {
            return Some(&pr.url);
        }
        if let Some((_, issue)) = self.selected_issue() {
            return Some(&issue.url);
        }
        self.selected_repo().map(|r| r.url.as_str())
    }

    /// Select a row by identity; unknown identities fall back to the first row
    /// and a placeholder falls back to its repository header.
    pub fn select(&mut self, id: &EntryId) {
        self.cursor = self.selectable(feed::resolve(&self.feed, id));
        self.sync_selected();
    }

    fn selectable(&self, index: usize) -> usize {
        match self.feed.get(index) {
            Some(entry) if entry.disabled => {
                feed::position_of(&self.feed, &EntryId::header(entry.id.repo())).unwrap_or(0)
            }
            _ => index,
        }
    }

    fn find_repo(&self, name: &str) -> Option<&RepositorySummary> {
        self.repos.iter().find(|r| r.name == name)
    }

    fn sync_selected(&mut self) {
        self.selected = self.feed.get(self.cursor).map(|e| e.id.clone());
    }

    fn rebuild(&mut self) {
        self.feed = feed::build_with(&self.repos, &self.expanded, self.view);
        self.cursor = self
            .selected
            .as_ref()
            .map(|id| self.selectable(feed::resolve(&self.feed, id)))
            .unwrap_or(0);
        self.sync_selected();
    }

    // =========================================================================
    // Aggregation results
    // =========================================================================

    /// Swap in a full pass, carrying forward known quality gate results.
    pub fn apply_full_refresh(&mut self, fresh: Vec<RepositorySummary>) {
        self.repos = summary::merge_preserving_quality_status(&self.repos, fresh);
        self.rebuild();
    }

    /// Swap in one refreshed repository (appended when it is new).
    pub fn apply_single_refresh(&mut self, fresh: RepositorySummary) {
        let merged = summary::merge_preserving_quality_status(&self.repos, vec![fresh]);
        for updated in merged {
            if self.repos.iter().any(|r| r.name == updated.name) {
                summary::replace_summary(&mut self.repos, updated);
            } else {
                self.repos.push(updated);
            }
        }
        self.rebuild();
    }

    /// Swap in the result of a quality pass over every repository.
    pub fn apply_quality_pass(&mut self, checked: Vec<RepositorySummary>) {
        self.repos = checked;
        self.rebuild();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn move_down(&mut self) {
        match self.view {
            SortView::Attention => {
                let next = (self.cursor + 1..self.feed.len()).find(|&i| !self.feed[i].disabled);
                if let Some(next) = next {
                    self.cursor = next;
                }
            }
            SortView::Activity => {
                if !self.feed.is_empty() {
                    self.cursor = (self.cursor + GRID_COLUMNS).min(self.feed.len() - 1);
                }
            }
        }
        self.sync_selected();
    }

    pub fn move_up(&mut self) {
        match self.view {
            SortView::Attention => {
                let prev = (0..self.cursor).rev().find(|&i| !self.feed[i].disabled);
                if let Some(prev) = prev {
                    self.cursor = prev;
                }
            }
            SortView::Activity => {
                self.cursor = self.cursor.saturating_sub(GRID_COLUMNS);
            }
        }
        self.sync_selected();
    }

    /// One cell left in the grid; no-op in the list
    pub fn move_left(&mut self) {
        if self.view == SortView::Activity && self.cursor > 0 {
            self.cursor -= 1;
            self.sync_selected();
        }
    }

    /// One cell right in the grid; no-op in the list
    pub fn move_right(&mut self) {
        if self.view == SortView::Activity && self.cursor + 1 < self.feed.len() {
            self.cursor += 1;
            self.sync_selected();
        }
    }

    /// Expand or collapse the selected repository.
    ///
    /// The repository's header is selected afterwards. No-op in the grid.
    pub fn toggle_expand(&mut self) {
        if !self.view.shows_children() {
            return;
        }
        let Some(id) = self.selected.as_ref() else {
            return;
        };

        let repo = id.repo().to_string();
        if !self.expanded.remove(&repo) {
            self.expanded.insert(repo.clone());
        }
        self.selected = Some(EntryId::header(repo));
        self.rebuild();
    }

    /// Expand a repository by name without moving the selection.
    ///
    /// Returns false for unknown repositories.
    pub fn expand(&mut self, repo: &str) -> bool {
        if self.find_repo(repo).is_none() {
            return false;
        }
        self.expanded.insert(repo.to_string());
        self.rebuild();
        true
    }

    /// Switch views, keeping the selection when the new view has it.
    ///
    /// A child row that the new view hides resolves to its repository's
    /// header.
    pub fn set_view(&mut self, view: SortView) {
        if self.view == view {
            return;
        }
        self.view = view;
        self.feed = feed::build_with(&self.repos, &self.expanded, self.view);

        self.cursor = match &self.selected {
            Some(id) => feed::position_of(&self.feed, id)
                .or_else(|| feed::position_of(&self.feed, &EntryId::header(id.repo())))
                .unwrap_or(0),
            None => 0,
        };
        self.sync_selected();
    }

    /// Detail pane for the selection.
    ///
    /// On a collapsed header this expands the repository instead and
    /// returns `None`. On an expanded header (or in the grid) it targets
    /// the first PR, else the first issue.
    pub fn open_detail(&mut self) -> Option<DetailTarget<'_>> {
        let id = self.selected.clone()?;

        if id.is_header() && self.view.shows_children() && !self.expanded.contains(id.repo()) {
            self.toggle_expand();
            return None;
        }

        let repo = self.find_repo(id.repo())?;
        match &id {
            EntryId::PullRequest { number, .. } => {
                let index = repo
                    .pull_requests
                    .as_ref()?
                    .iter()
                    .position(|pr| pr.number == *number)?;
                Some(DetailTarget::PullRequest { repo, index })
            }
            EntryId::Issue { number, .. } => {
                let index = repo.issues.iter().position(|i| i.number == *number)?;
                Some(DetailTarget::Issue { repo, index })
            }
            EntryId::RepoHeader { .. } => {
                if repo.pr_count() > 0 {
                    Some(DetailTarget::PullRequest { repo, index: 0 })
                } else if !repo.issues.is_empty() {
                    Some(DetailTarget::Issue { repo, index: 0 })
                } else {
                    None
                }
            }
            EntryId::Empty { .. } => None,
        }
    }
}
