//! Config module - dashboard configuration
//!
//! Manages `~/.repodash/config.toml`: the repository filter, organization
//! overrides, the local clone directory, quality gate server settings and
//! the launch command.
//!
//! A legacy `~/.repo-overview.json` is converted on first load.
//!
//! # Example
//!
//! ```no_run
//! use repodash::config;
//!
//! let (cfg, notice) = config::load();
//! if let Some(message) = notice {
//!     eprintln!("{}", message);
//! }
//! println!("Local clones under {}", cfg.local_code_path().display());
//! ```

mod internal;

use anyhow::Result;
use std::path::Path;

use crate::paths;

pub use internal::{Config, LaunchSection, SonarSection};

/// Load `~/.repodash/config.toml`, migrating the legacy file if needed.
///
/// Never fails. The second value is a message for the user: a migration
/// notice or the parse error that caused defaults to be used.
pub fn load() -> (Config, Option<String>) {
    internal::load_lenient(&paths::config_path(), &paths::legacy_config_path())
}

/// Strict load from an explicit path
pub fn load_from(path: &Path) -> Result<Config> {
    internal::load_from(path)
}

/// Save to `~/.repodash/config.toml`
pub fn save(config: &Config) -> Result<()> {
    internal::save_to(&paths::config_path(), config)
}

/// Save to an explicit path
pub fn save_to(path: &Path, config: &Config) -> Result<()> {
    internal::save_to(path, config)
}

/// Convert a legacy JSON config into TOML when the TOML file is absent.
///
/// Returns true if migration was performed.
pub fn migrate(json_path: &Path, toml_path: &Path) -> Result<bool> {
    internal::migrate_legacy_config(json_path, toml_path)
}
