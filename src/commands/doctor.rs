//! Doctor command - check external tools and configuration

use anyhow::Result;
use colored::Colorize;

use repodash::config;
use repodash::environment::{Environment, REQUIRED_TOOLS};
use repodash::forge::github;
use repodash::paths;

/// Returns the process exit code: 0 healthy, 1 when something is missing
pub fn execute() -> Result<i32> {
    println!("🏥 Checking environment...");

    let config_path = paths::config_path();
    let (config, notice) = config::load();
    let mut healthy = true;

    let mut tools: Vec<&str> = REQUIRED_TOOLS.to_vec();
    tools.push(config.launch.assistant.as_str());
    if let Some(terminal) = config.launch.terminal.first() {
        tools.push(terminal.as_str());
    }
    let env = Environment::detect(&tools);

    println!("\n{} ({}/{})", "Tools".bold(), env.os, env.arch);
    for (name, info) in &env.tools {
        if info.available {
            println!(
                "  {} {:<22} {}",
                "✓".green(),
                name,
                info.version.as_deref().unwrap_or("").dimmed()
            );
        } else {
            println!("  {} {:<22} {}", "✗".red(), name, "not found on PATH".red());
        }
    }
    if !env.missing().is_empty() {
        healthy = false;
    }

    println!("\n{}", "GitHub".bold());
    match github::is_authenticated() {
        Ok(true) => println!("  {} gh authenticated", "✓".green()),
        Ok(false) => {
            healthy = false;
            println!("  {} gh not authenticated (run `gh auth login`)", "✗".red());
        }
        Err(e) => {
            healthy = false;
            println!("  {} {}", "✗".red(), e);
        }
    }

    println!("\n{}", "Config".bold());
    if !config_path.exists() {
        println!(
            "  {} {} not found, using defaults",
            "•".dimmed(),
            config_path.display()
        );
    } else if let Err(e) = config::load_from(&config_path) {
        healthy = false;
        println!("  {} {}: {:#}", "✗".red(), config_path.display(), e);
    } else {
        println!("  {} {}", "✓".green(), config_path.display());
    }
    if let Some(notice) = notice {
        println!("  {} {}", "•".dimmed(), notice);
    }
    let clones = config.local_code_path();
    if clones.is_dir() {
        println!("  {} local clones in {}", "✓".green(), clones.display());
    } else {
        println!(
            "  {} {} does not exist; no repository will show as local",
            "⚠".yellow(),
            clones.display()
        );
    }

    println!();
    if healthy {
        println!("{}", "✓ Everything looks good".green());
        Ok(0)
    } else {
        println!("{}", "⚠ Some checks failed".yellow());
        Ok(1)
    }
}
