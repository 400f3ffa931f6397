//! Low-level git operations against a working copy at a given path

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Raw `git status --porcelain` output for a working copy
pub fn status_porcelain(path: &Path) -> Result<String> {
    let output = git(path, &["status", "--porcelain"])?;
    Ok(output)
}

/// Get the current branch name (`HEAD` when detached)
pub fn current_branch(path: &Path) -> Result<String> {
    let output = git(path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(output.trim().to_string())
}

/// Whether porcelain output lists a modified, added or deleted tracked file.
///
/// Untracked entries (`??`) don't make a working copy dirty.
pub fn has_tracked_changes(porcelain: &str) -> bool {
    porcelain
        .lines()
        .any(|line| !line.trim().is_empty() && !line.starts_with("??"))
}

fn git(path: &Path, args: &[&str]) -> Result<String> {
    debug!(path = %path.display(), args = %args.join(" "), "running git");

    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_only_is_clean() {
        let porcelain = "?? notes.txt\n?? scratch/\n";
        assert!(!has_tracked_changes(porcelain));
    }

    #[test]
    fn test_modified_is_dirty() {
        assert!(has_tracked_changes(" M src/main.rs\n?? notes.txt\n"));
        assert!(has_tracked_changes("A  new.rs\n"));
        assert!(has_tracked_changes(" D gone.rs\n"));
    }

    #[test]
    fn test_empty_is_clean() {
        assert!(!has_tracked_changes(""));
        assert!(!has_tracked_changes("\n"));
    }
}
