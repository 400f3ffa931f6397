//! Single source of truth for the repodash filesystem layout.
//!
//! This module defines WHERE files live. It has no I/O and no validation.
//!
//! ```text
//! ~/.repodash/
//! └── config.toml              # Dashboard config
//! ~/.repo-overview.json        # Legacy config, migrated on first load
//! ```

use std::path::PathBuf;

/// User's home directory, falling back to the working directory.
pub fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// repodash home directory: `~/.repodash/`
pub fn repodash_home() -> PathBuf {
    home().join(".repodash")
}

/// Config file: `~/.repodash/config.toml`
pub fn config_path() -> PathBuf {
    repodash_home().join("config.toml")
}

/// Legacy JSON config: `~/.repo-overview.json`
pub fn legacy_config_path() -> PathBuf {
    home().join(".repo-overview.json")
}
