//! Local working-copy state
//!
//! Handles:
//! - Uncommitted change detection (tracked files only)
//! - Current branch lookup
//!
//! Probing never fails: a missing directory, a missing `git` binary or a
//! non-repository all report a clean copy with no branch.

mod operations;

pub use operations::{current_branch, has_tracked_changes, status_porcelain};

use std::path::Path;
use tracing::warn;

/// Result of probing a local working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalState {
    pub has_uncommitted_changes: bool,
    pub current_branch: Option<String>,
}

/// Inspects a local working copy.
pub trait LocalProber: Send + Sync {
    fn probe(&self, path: &Path) -> LocalState;
}

/// `git` CLI implementation of LocalProber.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitProber;

impl LocalProber for GitProber {
    fn probe(&self, path: &Path) -> LocalState {
        probe(path)
    }
}

/// Dirty flag and branch for the working copy at `path`.
pub fn probe(path: &Path) -> LocalState {
    let porcelain = match status_porcelain(path) {
        Ok(output) => output,
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{:#}", e), "git status failed");
            return LocalState::default();
        }
    };

    let has_uncommitted_changes = has_tracked_changes(&porcelain);

    let current_branch = match current_branch(path) {
        Ok(branch) if !branch.is_empty() => Some(branch),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{:#}", e), "git rev-parse failed");
            None
        }
    };

    LocalState {
        has_uncommitted_changes,
        current_branch,
    }
}
