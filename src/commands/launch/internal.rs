//! Internal implementation for launch command
//!
//! Handles the launch flow: resolve owner → refresh repo → pick item → launch

use anyhow::{bail, Context, Result};

use repodash::config;
use repodash::forge::github;
use repodash::launcher;
use repodash::pipeline::Aggregator;

use super::LaunchOptions;

/// Main launch entry point
pub fn launch(options: LaunchOptions) -> Result<()> {
    let (config, notice) = config::load();
    if let Some(notice) = notice {
        eprintln!("{}", notice);
    }

    let (owner, name) = split_repo(&options.repo, config.github_org())?;
    let aggregator = Aggregator::from_config(config)?;

    println!("🔄 Refreshing {}/{}...", owner, name);
    let repo = aggregator.fetch_one(&owner, &name, false);

    let issue = match options.issue {
        Some(number) => Some(
            repo.find_issue(number)
                .with_context(|| format!("Issue #{} is not open in {}", number, repo.name))?,
        ),
        None => None,
    };
    let pr = match options.pr {
        Some(number) => Some(
            repo.find_pull_request(number)
                .with_context(|| format!("PR #{} is not open in {}", number, repo.name))?,
        ),
        None => None,
    };

    let status = launcher::launch(&repo, issue, pr, aggregator.config());
    if status.starts_with("Error") || status.starts_with("Repo not found") {
        bail!("{}", status);
    }
    println!("✓ {}", status);
    Ok(())
}

/// `owner/name`, or a bare name owned by the configured org or the `gh` user
fn split_repo(arg: &str, org: Option<&str>) -> Result<(String, String)> {
    if let Some((owner, name)) = arg.split_once('/') {
        if owner.is_empty() || name.is_empty() {
            bail!("Invalid repository '{}', expected owner/name", arg);
        }
        return Ok((owner.to_string(), name.to_string()));
    }

    let owner = match org {
        Some(org) => org.to_string(),
        None => github::current_user().context("Could not determine the GitHub user")?,
    };
    Ok((owner, arg.to_string()))
}
