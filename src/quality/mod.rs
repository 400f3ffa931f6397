//! Quality gate lookup (SonarCloud / SonarQube).
//!
//! "Do X": Find out whether a repository's static-analysis gate passes.
//!
//! A repository doesn't declare its Sonar project key, so keys are guessed
//! from naming conventions and tried in a fixed order. The first key that
//! resolves is attributed to the repository.
//!
//! # Example
//!
//! ```no_run
//! use repodash::quality::{self, SonarClient};
//!
//! let client = SonarClient::new("https://sonarcloud.io", None)?;
//! let keys = quality::guess_project_keys("acme", "widget", Some("acme-org"));
//! if let Some(status) = quality::resolve(&client, &keys) {
//!     println!("{} -> {:?}", status.project_key, status.status);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod internal;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use internal::SonarClient;

/// Overall (or per-condition) gate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    Ok,
    Error,
    Warn,
    None,
}

impl GateStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "OK" => GateStatus::Ok,
            "ERROR" => GateStatus::Error,
            "WARN" => GateStatus::Warn,
            _ => GateStatus::None,
        }
    }
}

/// One gate condition: a metric and whether it passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub metric_key: String,
    pub status: GateStatus,
}

impl Condition {
    pub fn is_failing(&self) -> bool {
        self.status == GateStatus::Error
    }
}

/// Quality gate result for one project key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGateStatus {
    pub project_key: String,
    pub status: GateStatus,
    pub url: String,
    pub conditions: Vec<Condition>,
}

impl QualityGateStatus {
    /// Metric keys of failing conditions, in gate order.
    pub fn failing_metrics(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|c| c.is_failing())
            .map(|c| c.metric_key.as_str())
            .collect()
    }
}

/// Source of quality gate results.
///
/// `None` covers every failure: unknown project, network error, timeout,
/// malformed response.
pub trait QualityGateSource: Send + Sync {
    fn project_status(&self, project_key: &str) -> Option<QualityGateStatus>;
}

/// Candidate project keys for a repository, in the order they must be tried.
///
/// Duplicates are kept; the order decides attribution when several remote
/// projects could match.
pub fn guess_project_keys(owner: &str, repo: &str, org: Option<&str>) -> Vec<String> {
    let mut keys = vec![
        format!("{}_{}", owner, repo),
        repo.to_string(),
        format!("{}_{}", owner.replace('-', "_"), repo.replace('-', "_")),
    ];

    if let Some(org) = org.filter(|o| !o.is_empty()) {
        keys.push(format!("{}_{}", org, repo));
        keys.push(format!("{}:{}", org, repo));
    }

    keys
}

/// Try each key in order; first non-absent status wins.
pub fn resolve(source: &dyn QualityGateSource, keys: &[String]) -> Option<QualityGateStatus> {
    for key in keys {
        if let Some(status) = source.project_status(key) {
            debug!(project_key = %key, status = ?status.status, "quality gate resolved");
            return Some(status);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        known: &'static str,
        asked: Mutex<Vec<String>>,
    }

    impl QualityGateSource for Recording {
        fn project_status(&self, project_key: &str) -> Option<QualityGateStatus> {
            self.asked.lock().unwrap().push(project_key.to_string());
            (project_key == self.known).then(|| QualityGateStatus {
                project_key: project_key.to_string(),
                status: GateStatus::Warn,
                url: String::new(),
                conditions: Vec::new(),
            })
        }
    }

    #[test]
    fn test_guess_keys_with_org() {
        let keys = guess_project_keys("acme", "widget", Some("myorg"));
        assert_eq!(
            keys,
            vec![
                "acme_widget",
                "widget",
                "acme_widget",
                "myorg_widget",
                "myorg:widget"
            ]
        );
    }

    #[test]
    fn test_guess_keys_normalizes_hyphens() {
        let keys = guess_project_keys("my-team", "cool-tool", None);
        assert_eq!(keys, vec!["my-team_cool-tool", "cool-tool", "my_team_cool_tool"]);
    }

    #[test]
    fn test_empty_org_is_ignored() {
        assert_eq!(guess_project_keys("a", "b", Some("")).len(), 3);
    }

    #[test]
    fn test_resolve_stops_at_first_hit() {
        let source = Recording {
            known: "widget",
            asked: Mutex::new(Vec::new()),
        };
        let keys = guess_project_keys("acme", "widget", Some("myorg"));

        let status = resolve(&source, &keys).unwrap();
        assert_eq!(status.project_key, "widget");
        assert_eq!(*source.asked.lock().unwrap(), vec!["acme_widget", "widget"]);
    }

    #[test]
    fn test_resolve_none_when_nothing_matches() {
        let source = Recording {
            known: "other",
            asked: Mutex::new(Vec::new()),
        };
        let keys = guess_project_keys("acme", "widget", None);
        assert!(resolve(&source, &keys).is_none());
        assert_eq!(source.asked.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_failing_metrics() {
        let status = QualityGateStatus {
            project_key: "k".to_string(),
            status: GateStatus::Error,
            url: String::new(),
            conditions: vec![
                Condition {
                    metric_key: "coverage".to_string(),
                    status: GateStatus::Error,
                },
                Condition {
                    metric_key: "bugs".to_string(),
                    status: GateStatus::Ok,
                },
            ],
        };
        assert_eq!(status.failing_metrics(), vec!["coverage"]);
    }
}
