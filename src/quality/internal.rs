//! Internal HTTP client implementation for quality gate lookups

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Condition, GateStatus, QualityGateSource, QualityGateStatus};

/// Every gate fetch is bounded; a timeout is just another absent result.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// SonarCloud / SonarQube web API client
pub struct SonarClient {
    base_url: String,
    token: Option<String>,
    http: HttpClient,
}

impl SonarClient {
    /// Create a client for the given server (e.g. `https://sonarcloud.io`)
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            http,
        })
    }

    /// `{base}/api/qualitygates/project_status?projectKey=<key>`
    pub fn status_url(&self, project_key: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/api/qualitygates/project_status", self.base_url),
            &[("projectKey", project_key)],
        )
        .with_context(|| format!("Invalid quality gate server URL: {}", self.base_url))
    }

    /// Human-facing dashboard for a project
    pub fn dashboard_url(&self, project_key: &str) -> String {
        Url::parse_with_params(
            &format!("{}/dashboard", self.base_url),
            &[("id", project_key)],
        )
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("{}/dashboard?id={}", self.base_url, project_key))
    }

    fn fetch(&self, project_key: &str) -> Result<QualityGateStatus> {
        let url = self.status_url(project_key)?;
        debug!(%url, "fetching quality gate");

        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        if !response.status().is_success() {
            bail!("Quality gate lookup returned status: {}", response.status());
        }

        let body = response
            .text()
            .context("Failed to read quality gate response")?;
        parse_project_status(project_key, &body, self.dashboard_url(project_key))
    }
}

impl QualityGateSource for SonarClient {
    fn project_status(&self, project_key: &str) -> Option<QualityGateStatus> {
        match self.fetch(project_key) {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(project_key, error = %format!("{:#}", e), "quality gate unavailable");
                None
            }
        }
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectStatusResponse {
    project_status: Option<ProjectStatusBody>,
}

#[derive(Debug, Deserialize)]
struct ProjectStatusBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    conditions: Vec<ConditionBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionBody {
    metric_key: String,
    #[serde(default)]
    status: String,
}

fn parse_project_status(project_key: &str, body: &str, url: String) -> Result<QualityGateStatus> {
    let response: ProjectStatusResponse =
        serde_json::from_str(body).context("Failed to parse quality gate response")?;

    let Some(project_status) = response.project_status else {
        bail!("Quality gate response has no projectStatus");
    };

    Ok(QualityGateStatus {
        project_key: project_key.to_string(),
        status: project_status
            .status
            .as_deref()
            .map(GateStatus::parse)
            .unwrap_or(GateStatus::None),
        url,
        conditions: project_status
            .conditions
            .into_iter()
            .map(|c| Condition {
                metric_key: c.metric_key,
                status: GateStatus::parse(&c.status),
            })
            .collect(),
    })
}
