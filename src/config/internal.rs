//! Internal implementation for config module
//!
//! Handles ~/.repodash/config.toml and migration from the legacy
//! ~/.repo-overview.json file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Config Types
// =============================================================================

/// Dashboard configuration stored in ~/.repodash/config.toml
/// Every field has a default so a partial file is valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Whitelist of repository names; empty disables it
    #[serde(default)]
    pub included_repos: Vec<String>,
    /// Blacklist, only consulted when the whitelist is empty
    #[serde(default)]
    pub excluded_repos: Vec<String>,
    /// Restrict repository listing to an organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_org: Option<String>,
    /// Base directory holding local clones (tilde allowed)
    #[serde(default = "default_local_code_path")]
    pub local_code_path: String,
    /// Top-level spelling kept from the legacy format
    #[serde(default, skip_serializing)]
    pub sonarcloud_org: Option<String>,
    #[serde(default)]
    pub sonar: SonarSection,
    #[serde(default)]
    pub launch: LaunchSection,
}

fn default_local_code_path() -> String {
    "~/Code".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            included_repos: Vec::new(),
            excluded_repos: Vec::new(),
            github_org: None,
            local_code_path: default_local_code_path(),
            sonarcloud_org: None,
            sonar: SonarSection::default(),
            launch: LaunchSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonarSection {
    /// Quality gate server
    #[serde(default = "default_sonar_url")]
    pub url: String,
    /// Organization used to widen project key guessing
    #[serde(default, alias = "sonarcloud_org", skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// API token; SONAR_TOKEN is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_sonar_url() -> String {
    "https://sonarcloud.io".to_string()
}

impl Default for SonarSection {
    fn default() -> Self {
        Self {
            url: default_sonar_url(),
            organization: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSection {
    /// Terminal argv prefix; `{path}` and `{title}` are substituted.
    /// Empty runs the assistant directly.
    #[serde(default = "default_terminal")]
    pub terminal: Vec<String>,
    /// Assistant executable
    #[serde(default = "default_assistant")]
    pub assistant: String,
    /// Prompt used when no issue or PR is selected
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
}

fn default_terminal() -> Vec<String> {
    vec![
        "x-terminal-emulator".to_string(),
        "-T".to_string(),
        "{title}".to_string(),
        "-e".to_string(),
    ]
}
fn default_assistant() -> String {
    "claude".to_string()
}
fn default_prompt() -> String {
    "/StartOfTheDay".to_string()
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            terminal: default_terminal(),
            assistant: default_assistant(),
            default_prompt: default_prompt(),
        }
    }
}

impl Config {
    /// Whitelist wins when non-empty; otherwise the blacklist applies.
    pub fn includes(&self, repo_name: &str) -> bool {
        if !self.included_repos.is_empty() {
            return self.included_repos.iter().any(|r| r == repo_name);
        }
        !self.excluded_repos.iter().any(|r| r == repo_name)
    }

    /// `local_code_path` with `~` expanded
    pub fn local_code_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.local_code_path).into_owned())
    }

    /// Where a repository would be cloned, whether or not it is
    pub fn expected_local_path(&self, repo_name: &str) -> PathBuf {
        self.local_code_path().join(repo_name)
    }

    /// Existing local clone of a repository
    pub fn local_path_for(&self, repo_name: &str) -> Option<PathBuf> {
        let path = self.expected_local_path(repo_name);
        path.is_dir().then_some(path)
    }

    pub fn github_org(&self) -> Option<&str> {
        self.github_org.as_deref().filter(|o| !o.is_empty())
    }

    pub fn sonar_org(&self) -> Option<&str> {
        self.sonar
            .organization
            .as_deref()
            .or(self.sonarcloud_org.as_deref())
            .filter(|o| !o.is_empty())
    }

    /// Configured token, else the SONAR_TOKEN environment variable
    pub fn sonar_token(&self) -> Option<String> {
        self.sonar
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("SONAR_TOKEN").ok().filter(|t| !t.is_empty()))
    }
}

// =============================================================================
// Load/Save
// =============================================================================

/// Load config from a TOML file; a missing file yields defaults
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    toml::from_str(&contents).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Save config as pretty TOML, creating parent directories
pub fn save_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, contents).with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

// =============================================================================
// Migration
// =============================================================================

/// Convert a legacy JSON config into a TOML config.
/// Only runs when the TOML file is absent; the JSON file is left in place.
/// Returns true if migration was performed
pub fn migrate_legacy_config(json_path: &Path, toml_path: &Path) -> Result<bool> {
    if toml_path.exists() || !json_path.exists() {
        return Ok(false);
    }

    let json_content = fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read legacy config: {}", json_path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&json_content)
        .with_context(|| format!("Failed to parse legacy config: {}", json_path.display()))?;

    let mut config = Config::default();

    config.included_repos = string_list(&json, "included_repos");
    config.excluded_repos = string_list(&json, "excluded_repos");
    if let Some(org) = json.get("github_org").and_then(|v| v.as_str()) {
        config.github_org = Some(org.to_string());
    }
    if let Some(org) = json.get("sonarcloud_org").and_then(|v| v.as_str()) {
        config.sonar.organization = Some(org.to_string());
    }
    if let Some(path) = json.get("local_code_path").and_then(|v| v.as_str()) {
        config.local_code_path = path.to_string();
    }

    save_to(toml_path, &config)?;
    Ok(true)
}

fn string_list(json: &serde_json::Value, key: &str) -> Vec<String> {
    json.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Migrate if needed, then load.
///
/// Never fails: a broken file yields defaults plus a message for the user.
pub fn load_lenient(toml_path: &Path, json_path: &Path) -> (Config, Option<String>) {
    let mut notice = None;

    match migrate_legacy_config(json_path, toml_path) {
        Ok(true) => {
            notice = Some(format!(
                "Migrated {} → {}",
                json_path.display(),
                toml_path.display()
            ))
        }
        Ok(false) => {}
        Err(e) => notice = Some(format!("Config migration failed: {:#}", e)),
    }

    match load_from(toml_path) {
        Ok(config) => (config, notice),
        Err(e) => (Config::default(), Some(format!("{:#} (using defaults)", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.included_repos.is_empty());
        assert_eq!(config.local_code_path, "~/Code");
        assert_eq!(config.sonar.url, "https://sonarcloud.io");
        assert_eq!(config.launch.assistant, "claude");
        assert_eq!(config.launch.default_prompt, "/StartOfTheDay");
        assert!(config.sonar_org().is_none());
    }

    #[test]
    fn test_whitelist_wins_over_blacklist() {
        let config = Config {
            included_repos: vec!["a".to_string(), "b".to_string()],
            excluded_repos: vec!["a".to_string()],
            ..Default::default()
        };
        assert!(config.includes("a"));
        assert!(config.includes("b"));
        assert!(!config.includes("c"));
    }

    #[test]
    fn test_blacklist_without_whitelist() {
        let config = Config {
            excluded_repos: vec!["old".to_string()],
            ..Default::default()
        };
        assert!(!config.includes("old"));
        assert!(config.includes("new"));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/config.toml");

        let mut config = Config::default();
        config.excluded_repos = vec!["dotfiles".to_string()];
        config.sonar.organization = Some("myorg".to_string());

        save_to(&path, &config).unwrap();
        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "github_org = \"acme\"\n[sonar]\nsonarcloud_org = \"myorg\"\n").unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(config.github_org(), Some("acme"));
        assert_eq!(config.sonar_org(), Some("myorg"));
        assert_eq!(config.sonar.url, "https://sonarcloud.io");
        assert_eq!(config.launch.assistant, "claude");
    }

    #[test]
    fn test_top_level_sonarcloud_org() {
        let config: Config = toml::from_str("sonarcloud_org = \"legacy\"\n").unwrap();
        assert_eq!(config.sonar_org(), Some("legacy"));
    }

    #[test]
    fn test_configured_token_wins() {
        let mut config = Config::default();
        config.sonar.token = Some("abc".to_string());
        assert_eq!(config.sonar_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_local_path_requires_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("widget")).unwrap();
        fs::write(tmp.path().join("notes"), "x").unwrap();

        let config = Config {
            local_code_path: tmp.path().display().to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.local_path_for("widget"),
            Some(tmp.path().join("widget"))
        );
        assert!(config.local_path_for("notes").is_none());
        assert!(config.local_path_for("missing").is_none());
    }

    #[test]
    fn test_migrate_legacy_config() {
        let tmp = TempDir::new().unwrap();
        let json_path = tmp.path().join(".repo-overview.json");
        let toml_path = tmp.path().join(".repodash/config.toml");

        let json = r#"{
            "excluded_repos": ["archive"],
            "sonarcloud_org": "myorg",
            "github_org": null,
            "local_code_path": "~/src"
        }"#;
        fs::write(&json_path, json).unwrap();

        assert!(migrate_legacy_config(&json_path, &toml_path).unwrap());

        let config = load_from(&toml_path).unwrap();
        assert_eq!(config.excluded_repos, vec!["archive"]);
        assert_eq!(config.sonar_org(), Some("myorg"));
        assert!(config.github_org.is_none());
        assert_eq!(config.local_code_path, "~/src");

        // Legacy file stays; a second run is a no-op
        assert!(json_path.exists());
        assert!(!migrate_legacy_config(&json_path, &toml_path).unwrap());
    }

    #[test]
    fn test_lenient_load_reports_parse_error() {
        let tmp = TempDir::new().unwrap();
        let toml_path = tmp.path().join("config.toml");
        fs::write(&toml_path, "included_repos = [unterminated").unwrap();

        let (config, notice) = load_lenient(&toml_path, &tmp.path().join("none.json"));
        assert_eq!(config, Config::default());
        assert!(notice.unwrap().contains("using defaults"));
    }
}
