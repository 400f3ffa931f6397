//! Launch command - start the assistant in a repository's local clone
//!
//! # Usage
//!
//! ```bash
//! repodash launch widget              # Default prompt
//! repodash launch widget --issue 12   # Work on an issue
//! repodash launch widget --pr 40      # Work on a pull request
//! ```

mod internal;

use anyhow::Result;

/// Launch options
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Repository name (owner comes from config or the authenticated user)
    pub repo: String,
    /// Issue to work on
    pub issue: Option<u64>,
    /// Pull request to work on
    pub pr: Option<u64>,
}

/// Execute the launch command
pub fn execute(options: LaunchOptions) -> Result<()> {
    internal::launch(options)
}
