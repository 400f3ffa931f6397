//! Internal implementation for GitHub ForgeReader.
//!
//! Contains gh CLI calls and JSON parsing.
//! Not exposed in public interface.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

use crate::forge::{
    Author, CheckState, ChecksStatus, Issue, IssueState, Mergeable, PrState, PullRequest,
    RepoListing, ReviewDecision,
};

const REPO_FIELDS: &str =
    "name,owner,url,hasIssuesEnabled,primaryLanguage,repositoryTopics,description";
const ISSUE_FIELDS: &str = "number,title,url,labels,state,body,assignees";
const PR_FIELDS: &str = "number,title,url,author,state,isDraft,labels,body,reviewRequests,\
reviewDecision,headRefName,baseRefName,createdAt,updatedAt,mergeable,statusCheckRollup";

// ============================================================================
// gh CLI JSON types (internal, match gh output format)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhRepo {
    name: String,
    owner: GhUser,
    url: String,
    #[serde(default = "default_true")]
    has_issues_enabled: bool,
    primary_language: Option<GhNamed>,
    repository_topics: Option<Vec<GhNamed>>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhIssue {
    number: u64,
    title: String,
    url: String,
    #[serde(default)]
    labels: Vec<GhNamed>,
    state: String,
    body: Option<String>,
    #[serde(default)]
    assignees: Vec<GhUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPullRequest {
    number: u64,
    title: String,
    url: String,
    author: Option<GhAuthor>,
    state: String,
    #[serde(default)]
    is_draft: bool,
    #[serde(default)]
    labels: Vec<GhNamed>,
    body: Option<String>,
    #[serde(default)]
    review_requests: Vec<GhReviewRequest>,
    review_decision: Option<String>,
    head_ref_name: Option<String>,
    base_ref_name: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    mergeable: Option<String>,
    status_check_rollup: Option<GhCheckRollup>,
}

#[derive(Debug, Deserialize)]
struct GhNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhAuthor {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

/// Requested reviewer: a user (login) or a team (name/slug).
#[derive(Debug, Deserialize)]
struct GhReviewRequest {
    login: Option<String>,
    name: Option<String>,
    slug: Option<String>,
}

/// `gh pr list` emits the rollup as a bare array of contexts; older
/// versions wrapped it in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GhCheckRollup {
    Contexts(Vec<GhCheckContext>),
    Wrapped {
        #[serde(default)]
        contexts: Vec<GhCheckContext>,
    },
}

/// A StatusContext carries `state`; a CheckRun carries `status` and, once
/// finished, `conclusion`.
#[derive(Debug, Deserialize)]
struct GhCheckContext {
    state: Option<String>,
    conclusion: Option<String>,
    status: Option<String>,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Public functions (called by GitHubReader)
// ============================================================================

/// Check if `gh` CLI is authenticated.
pub(crate) fn check_gh_auth(binary: &str) -> Result<bool> {
    let output = Command::new(binary)
        .args(["auth", "status"])
        .output()
        .context("Failed to run `gh auth status`. Is `gh` CLI installed?")?;

    Ok(output.status.success())
}

/// Login of the authenticated user.
pub(crate) fn fetch_current_user(binary: &str) -> Result<String> {
    let stdout = run_gh(binary, &["api", "user", "--jq", ".login"])?;
    let login = String::from_utf8_lossy(&stdout).trim().to_string();
    if login.is_empty() {
        bail!("gh api user returned no login");
    }
    Ok(login)
}

/// List repositories for the user, or for an organization.
pub(crate) fn fetch_repositories(
    binary: &str,
    org: Option<&str>,
    limit: usize,
) -> Result<Vec<RepoListing>> {
    let limit = limit.to_string();
    let mut args = vec!["repo", "list"];
    if let Some(org) = org {
        args.push(org);
    }
    args.extend(["--json", REPO_FIELDS, "--limit", limit.as_str()]);

    let stdout = run_gh(binary, &args)?;
    parse_repositories(&stdout)
}

/// Describe a single repository.
pub(crate) fn fetch_repository(binary: &str, repo: &str) -> Result<RepoListing> {
    let stdout = run_gh(binary, &["repo", "view", repo, "--json", REPO_FIELDS])?;
    let gh_repo: GhRepo =
        serde_json::from_slice(&stdout).context("Failed to parse GitHub repository JSON")?;
    Ok(into_listing(gh_repo))
}

/// Fetch open issues via gh CLI.
pub(crate) fn fetch_open_issues(binary: &str, repo: &str, limit: usize) -> Result<Vec<Issue>> {
    let limit = limit.to_string();
    let stdout = run_gh(
        binary,
        &[
            "issue", "list", "--repo", repo, "--json", ISSUE_FIELDS, "--limit", limit.as_str(),
        ],
    )?;
    parse_open_issues(&stdout)
}

/// Fetch open pull requests via gh CLI.
pub(crate) fn fetch_open_pull_requests(
    binary: &str,
    repo: &str,
    limit: usize,
) -> Result<Vec<PullRequest>> {
    let limit = limit.to_string();
    let stdout = run_gh(
        binary,
        &[
            "pr", "list", "--repo", repo, "--json", PR_FIELDS, "--limit", limit.as_str(),
        ],
    )?;
    parse_pull_requests(&stdout)
}

fn run_gh(binary: &str, args: &[&str]) -> Result<Vec<u8>> {
    debug!(command = %format!("{} {}", binary, args.join(" ")), "running gh");

    let output = Command::new(binary)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run `gh {}`", args[..2.min(args.len())].join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "gh {} failed: {}",
            args[..2.min(args.len())].join(" "),
            stderr.trim()
        );
    }

    Ok(output.stdout)
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_repositories(json: &[u8]) -> Result<Vec<RepoListing>> {
    let repos: Vec<GhRepo> =
        serde_json::from_slice(json).context("Failed to parse GitHub repository list JSON")?;
    Ok(repos.into_iter().map(into_listing).collect())
}

fn parse_open_issues(json: &[u8]) -> Result<Vec<Issue>> {
    let issues: Vec<GhIssue> =
        serde_json::from_slice(json).context("Failed to parse GitHub issues JSON")?;

    Ok(issues
        .into_iter()
        .map(into_issue)
        .filter(|issue| issue.state == IssueState::Open)
        .collect())
}

fn parse_pull_requests(json: &[u8]) -> Result<Vec<PullRequest>> {
    let prs: Vec<GhPullRequest> =
        serde_json::from_slice(json).context("Failed to parse GitHub PRs JSON")?;
    Ok(prs.into_iter().map(into_pull_request).collect())
}

// ============================================================================
// Conversion functions
// ============================================================================

fn into_listing(gh: GhRepo) -> RepoListing {
    let topics = gh
        .repository_topics
        .filter(|topics| !topics.is_empty())
        .map(|topics| topics.into_iter().map(|t| t.name).collect());

    RepoListing {
        name: gh.name,
        owner: gh.owner.login,
        url: gh.url,
        has_issues_enabled: gh.has_issues_enabled,
        language: gh.primary_language.map(|l| l.name),
        topics,
        description: gh.description.filter(|d| !d.is_empty()),
    }
}

fn into_issue(gh: GhIssue) -> Issue {
    Issue {
        number: gh.number,
        title: gh.title,
        url: gh.url,
        labels: gh.labels.into_iter().map(|l| l.name).collect(),
        state: parse_issue_state(&gh.state),
        body: gh.body.unwrap_or_default(),
        assignee: gh.assignees.into_iter().next().map(|a| a.login),
    }
}

fn into_pull_request(gh: GhPullRequest) -> PullRequest {
    let reviewers: Vec<String> = gh
        .review_requests
        .into_iter()
        .filter_map(|r| r.login.or(r.name).or(r.slug))
        .collect();

    let checks = match gh.status_check_rollup {
        Some(GhCheckRollup::Contexts(contexts)) | Some(GhCheckRollup::Wrapped { contexts }) => {
            ChecksStatus::reduce(contexts.iter().filter_map(check_state))
        }
        None => ChecksStatus::None,
    };

    let author = gh
        .author
        .map(|a| Author {
            login: a.login,
            name: a.name.filter(|n| !n.is_empty()),
        })
        .unwrap_or_else(|| Author {
            login: "unknown".to_string(),
            name: None,
        });

    PullRequest {
        number: gh.number,
        title: gh.title,
        url: gh.url,
        author,
        state: parse_pr_state(&gh.state),
        draft: gh.is_draft,
        labels: gh.labels.into_iter().map(|l| l.name).collect(),
        body: gh.body.unwrap_or_default(),
        reviewers: if reviewers.is_empty() {
            None
        } else {
            Some(reviewers)
        },
        review_decision: parse_review_decision(gh.review_decision.as_deref()),
        head_ref: gh.head_ref_name,
        base_ref: gh.base_ref_name,
        created_at: gh.created_at.as_deref().and_then(parse_timestamp),
        updated_at: gh.updated_at.as_deref().and_then(parse_timestamp),
        mergeable: parse_mergeable(gh.mergeable.as_deref()),
        checks,
    }
}

/// Classify one check context. Contexts with no usable state are skipped.
fn check_state(ctx: &GhCheckContext) -> Option<CheckState> {
    let reported = [ctx.state.as_deref(), ctx.conclusion.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty());

    let value = match reported {
        Some(value) => value,
        // An unfinished CheckRun has no conclusion yet
        None => match ctx.status.as_deref() {
            Some(status) if !status.eq_ignore_ascii_case("COMPLETED") && !status.is_empty() => {
                return Some(CheckState::Pending)
            }
            _ => return None,
        },
    };

    Some(match value.to_uppercase().as_str() {
        "SUCCESS" => CheckState::Success,
        "FAILURE" | "ERROR" | "TIMED_OUT" | "STARTUP_FAILURE" | "ACTION_REQUIRED" => {
            CheckState::Failure
        }
        "PENDING" | "EXPECTED" | "IN_PROGRESS" | "QUEUED" | "WAITING" | "REQUESTED" => {
            CheckState::Pending
        }
        _ => CheckState::Other,
    })
}

fn parse_issue_state(state: &str) -> IssueState {
    match state.to_uppercase().as_str() {
        "OPEN" => IssueState::Open,
        _ => IssueState::Closed,
    }
}

fn parse_pr_state(state: &str) -> PrState {
    match state.to_uppercase().as_str() {
        "OPEN" => PrState::Open,
        "MERGED" => PrState::Merged,
        _ => PrState::Closed,
    }
}

fn parse_review_decision(decision: Option<&str>) -> ReviewDecision {
    match decision.map(str::to_uppercase).as_deref() {
        Some("APPROVED") => ReviewDecision::Approved,
        Some("CHANGES_REQUESTED") => ReviewDecision::ChangesRequested,
        Some("REVIEW_REQUIRED") => ReviewDecision::ReviewRequired,
        _ => ReviewDecision::None,
    }
}

fn parse_mergeable(mergeable: Option<&str>) -> Mergeable {
    match mergeable.map(str::to_uppercase).as_deref() {
        Some("MERGEABLE") => Mergeable::Mergeable,
        Some("CONFLICTING") => Mergeable::Conflicting,
        _ => Mergeable::Unknown,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
