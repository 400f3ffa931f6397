//! External tool detection for `repodash doctor`

use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::process::Command;

/// Tools every installation needs, besides the configured assistant
pub const REQUIRED_TOOLS: &[&str] = &["gh", "git"];

#[derive(Debug, Serialize)]
pub struct Environment {
    pub os: String,
    pub arch: String,
    pub tools: BTreeMap<String, ToolInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<String>,
}

impl Environment {
    /// Probe the given tools on PATH
    pub fn detect(tools: &[&str]) -> Self {
        Environment {
            os: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            tools: tools
                .iter()
                .map(|name| (name.to_string(), detect_tool(name)))
                .collect(),
        }
    }

    pub fn missing(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|(_, info)| !info.available)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Locate a tool with `which` and read the first line of `--version`
pub fn detect_tool(name: &str) -> ToolInfo {
    let Ok(path) = which::which(name) else {
        return ToolInfo {
            available: false,
            version: None,
            path: None,
        };
    };

    let version = Command::new(&path)
        .arg("--version")
        .output()
        .ok()
        .map(|output| String::from_utf8_lossy(&output.stdout).to_string())
        .and_then(|stdout| stdout.lines().next().map(|l| l.trim().to_string()))
        .filter(|line| !line.is_empty());

    ToolInfo {
        available: true,
        version,
        path: Some(path.display().to_string()),
    }
}
