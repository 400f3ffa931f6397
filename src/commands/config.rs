//! Config command - print or initialize `~/.repodash/config.toml`

use anyhow::{bail, Context, Result};

use repodash::config::{self, Config};
use repodash::paths;

pub fn execute(init: bool) -> Result<()> {
    let path = paths::config_path();

    if init {
        if path.exists() {
            bail!("Config already exists at {}", path.display());
        }
        config::save(&Config::default())?;
        println!("✓ Wrote default config to {}", path.display());
        return Ok(());
    }

    let (config, notice) = config::load();
    if let Some(notice) = notice {
        eprintln!("{}", notice);
    }

    let rendered = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("# {}", path.display());
    print!("{}", rendered);
    Ok(())
}
