//! Quality command - show how a repository's gate is resolved

use anyhow::Result;
use colored::Colorize;

use repodash::config;
use repodash::quality::{self, GateStatus, SonarClient};

pub fn execute(owner: &str, repo: &str) -> Result<()> {
    let (config, notice) = config::load();
    if let Some(notice) = notice {
        eprintln!("{}", notice);
    }

    let client = SonarClient::new(&config.sonar.url, config.sonar_token())?;
    let keys = quality::guess_project_keys(owner, repo, config.sonar_org());

    println!("🔎 Project keys for {}/{} (tried in order):", owner, repo);
    for (i, key) in keys.iter().enumerate() {
        println!("  {}. {}", i + 1, key);
    }
    println!();

    match quality::resolve(&client, &keys) {
        Some(status) => {
            let label = match status.status {
                GateStatus::Ok => "OK".green(),
                GateStatus::Warn => "WARN".yellow(),
                GateStatus::Error => "ERROR".red(),
                GateStatus::None => "NONE".dimmed(),
            };
            println!("✓ {} resolved: {}", status.project_key.bold(), label);
            let failing = status.failing_metrics();
            if !failing.is_empty() {
                println!("  Failing: {}", failing.join(", "));
            }
            println!("  {}", status.url.blue());
        }
        None => {
            println!("{}", "No Sonar project found".dimmed());
        }
    }

    Ok(())
}
