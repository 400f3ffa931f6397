//! Launcher - hand a repository, issue or PR to a coding assistant
//!
//! "Do X": Open a terminal in the local clone and start the assistant with
//! a prompt describing the selected work.
//!
//! Nothing here returns an error to the caller. Every outcome, including
//! a missing clone or a missing terminal, comes back as a status line.
//!
//! # Example
//!
//! ```no_run
//! use repodash::config::Config;
//! use repodash::launcher;
//! # use repodash::summary::RepositorySummary;
//! # fn selected() -> RepositorySummary { unimplemented!() }
//!
//! let config = Config::default();
//! let repo = selected();
//! println!("{}", launcher::launch(&repo, None, None, &config));
//! ```

mod internal;

use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{Config, LaunchSection};
use crate::forge::{Issue, PullRequest};
use crate::summary::RepositorySummary;

/// Fully resolved command line for a launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// Prompt for the assistant. A PR wins over an issue.
pub fn build_prompt(
    issue: Option<&Issue>,
    pr: Option<&PullRequest>,
    launch: &LaunchSection,
) -> String {
    if let Some(pr) = pr {
        let draft = if pr.draft { " (DRAFT)" } else { "" };
        return format!("Work on PR #{}{}: {}", pr.number, draft, pr.title);
    }
    if let Some(issue) = issue {
        return format!("Work on issue #{}: {}", issue.number, issue.title);
    }
    launch.default_prompt.clone()
}

/// Terminal template with `{path}`/`{title}` filled in, then the assistant
/// and its prompt. `None` when the repository has no local clone.
pub fn build_command(
    repo: &RepositorySummary,
    issue: Option<&Issue>,
    pr: Option<&PullRequest>,
    launch: &LaunchSection,
) -> Option<LaunchCommand> {
    let cwd = repo.local_path.clone()?;
    let path = cwd.display().to_string();

    let mut argv: Vec<String> = launch
        .terminal
        .iter()
        .map(|arg| arg.replace("{path}", &path).replace("{title}", &repo.name))
        .collect();
    argv.push(launch.assistant.clone());
    argv.push(build_prompt(issue, pr, launch));

    let program = argv.remove(0);
    Some(LaunchCommand {
        program,
        args: argv,
        cwd,
    })
}

/// Launch the assistant for a selection, returning a status line.
pub fn launch(
    repo: &RepositorySummary,
    issue: Option<&Issue>,
    pr: Option<&PullRequest>,
    config: &Config,
) -> String {
    let Some(command) = build_command(repo, issue, pr, &config.launch) else {
        return format!(
            "Repo not found locally: {}",
            config.expected_local_path(&repo.name).display()
        );
    };

    match internal::spawn_detached(&command) {
        Ok(()) => {
            let assistant = &config.launch.assistant;
            let message = if let Some(pr) = pr {
                format!("Launched {} for {} PR #{}", assistant, repo.name, pr.number)
            } else if let Some(issue) = issue {
                format!("Launched {} for {} #{}", assistant, repo.name, issue.number)
            } else {
                format!("Launched {} for {}", assistant, repo.name)
            };
            info!(repo = %repo.name, "{}", message);
            message
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(program = %command.program, "launch program not found");
            format!("Error: {} not found", command.program)
        }
        Err(e) => {
            warn!(program = %command.program, error = %e, "launch failed");
            format!("Error launching: {}", e)
        }
    }
}

/// Open a URL with the platform opener, returning a status line.
pub fn open_url(url: &str) -> String {
    match internal::spawn_quiet(internal::opener(url)) {
        Ok(()) => "Opening in browser...".to_string(),
        Err(e) => {
            warn!(url, error = %e, "failed to open browser");
            format!("Error opening browser: {}", e)
        }
    }
}
