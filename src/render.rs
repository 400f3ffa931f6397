//! Plain-text rendering of the dashboard.
//!
//! Label builders return uncoloured text so they can be tested; the
//! `render_*` functions add colour with `colored`.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::dashboard::{Dashboard, GRID_COLUMNS};
use crate::feed::{EntryId, FeedEntry, SortView};
use crate::forge::{ChecksStatus, Issue, Mergeable, PullRequest, ReviewDecision};
use crate::quality::GateStatus;
use crate::summary::RepositorySummary;

const CARD_WIDTH: usize = 30;

// =============================================================================
// Labels
// =============================================================================

/// Severity shown as the coloured dot on a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Clear,
}

pub fn severity(repo: &RepositorySummary) -> Severity {
    match repo.gate() {
        Some(GateStatus::Error) => return Severity::Critical,
        Some(GateStatus::Warn) => return Severity::Warning,
        _ => {}
    }
    match repo.open_issues_count {
        n if n >= 10 => Severity::Critical,
        n if n >= 5 => Severity::Warning,
        0 => Severity::Clear,
        _ => Severity::Info,
    }
}

/// Quality gate indicator; `None` when the gate was never checked.
///
/// A check that found no project reads "No Sonar", distinct from a pass.
pub fn quality_label(repo: &RepositorySummary) -> Option<String> {
    match &repo.sonar_status {
        Some(status) => match status.status {
            GateStatus::Error => {
                let failing = status.failing_metrics();
                if failing.is_empty() {
                    Some("✗ Quality Gate".to_string())
                } else {
                    let shown: Vec<&str> = failing.into_iter().take(3).collect();
                    Some(format!("✗ {}", shown.join(", ")))
                }
            }
            GateStatus::Warn => Some("⚠ Quality Gate".to_string()),
            GateStatus::Ok => Some("✓ Sonar".to_string()),
            GateStatus::None => None,
        },
        None if repo.sonar_checked => Some("No Sonar".to_string()),
        None => None,
    }
}

/// Local working-copy state: dirty flag with branch, branch, or remote.
pub fn local_label(repo: &RepositorySummary) -> Option<String> {
    if repo.local_path.is_none() {
        return Some("[remote]".to_string());
    }
    if repo.has_uncommitted_changes {
        return Some(match &repo.current_branch {
            Some(branch) => format!("✱ uncommitted on {}", branch),
            None => "✱ uncommitted".to_string(),
        });
    }
    repo.current_branch.as_ref().map(|b| format!("[{}]", b))
}

/// "2 PRs, 3 issues"; `None` when there are neither.
pub fn counts_label(repo: &RepositorySummary) -> Option<String> {
    let mut parts = Vec::new();
    if repo.pr_count() > 0 {
        parts.push(format!("{} PRs", repo.pr_count()));
    }
    if repo.open_issues_count > 0 {
        parts.push(format!("{} issues", repo.open_issues_count));
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// How long a PR has been open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    Fresh,
    Recent,
    Stale,
    Old,
}

pub fn age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Age {
    match (now - created_at).num_days() {
        d if d < 7 => Age::Fresh,
        d if d < 30 => Age::Recent,
        d if d < 90 => Age::Stale,
        _ => Age::Old,
    }
}

/// Activity heuristic shown on grid cards.
pub fn activity_label(repo: &RepositorySummary) -> Option<&'static str> {
    match repo.open_issues_count + repo.pr_count() {
        n if n >= 5 => Some("🔥 active"),
        n if n >= 2 => Some("🟡 moderate"),
        0 => Some("🟢 stable"),
        _ => None,
    }
}

// =============================================================================
// List rows
// =============================================================================

pub fn render_header(repo: &RepositorySummary, expanded: bool) -> String {
    let dot = match severity(repo) {
        Severity::Critical => "●".red(),
        Severity::Warning => "●".yellow(),
        Severity::Info => "●".blue(),
        Severity::Clear => "●".green(),
    };
    let marker = if expanded { "▼" } else { "▶" };

    let mut line = format!("{} {} {}", dot, marker, repo.name.bold());
    if let Some(language) = &repo.language {
        line.push_str(&format!(" {}", format!("[{}]", language).cyan()));
    }
    if let Some(cloud) = repo.cloud_env() {
        line.push_str(&format!(" {}", format!("[{}]", cloud).magenta()));
    }
    if let Some(counts) = counts_label(repo) {
        line.push_str(&format!(" {}", counts.dimmed()));
    }
    if let Some(local) = local_label(repo) {
        let styled = if repo.has_uncommitted_changes && repo.local_path.is_some() {
            local.yellow()
        } else {
            local.dimmed()
        };
        line.push_str(&format!(" {}", styled));
    }
    if let Some(quality) = quality_label(repo) {
        let styled = match repo.gate() {
            Some(GateStatus::Error) => quality.red(),
            Some(GateStatus::Warn) => quality.yellow(),
            Some(GateStatus::Ok) => quality.green(),
            _ => quality.dimmed(),
        };
        line.push_str(&format!(" {}", styled));
    }
    line
}

pub fn render_pr_row(pr: &PullRequest, now: DateTime<Utc>) -> String {
    let mut line = format!("    {}", format!("PR #{}", pr.number).green());
    if pr.draft {
        line.push_str(&format!(" {}", "draft".dimmed()));
    }
    if let Some(created) = pr.created_at {
        let text = format!("on {}", created.format("%Y-%m-%d"));
        let styled: ColoredString = match age(created, now) {
            Age::Fresh => text.green(),
            Age::Recent => text.dimmed(),
            Age::Stale => text.yellow(),
            Age::Old => text.red(),
        };
        line.push_str(&format!(" {}", styled));
    }
    line.push_str(&format!(
        " {}",
        format!("by {}", pr.author.display_name()).dimmed()
    ));
    line.push_str(&format!(" {}", pr.title));
    line
}

pub fn render_issue_row(issue: &Issue) -> String {
    format!(
        "    {} {}",
        format!("#{}", issue.number).dimmed(),
        issue.title
    )
}

pub fn render_empty_row(description: Option<&str>) -> String {
    format!(
        "    {}\n    {}",
        "No issues or PRs".dimmed(),
        description.unwrap_or("No description").italic()
    )
}

fn render_entry(dash: &Dashboard, entry: &FeedEntry, now: DateTime<Utc>) -> Option<String> {
    let repo = dash.repos().iter().find(|r| r.name == entry.id.repo())?;
    Some(match &entry.id {
        EntryId::RepoHeader { .. } => render_header(repo, dash.is_expanded(&repo.name)),
        EntryId::PullRequest { number, .. } => render_pr_row(repo.find_pull_request(*number)?, now),
        EntryId::Issue { number, .. } => render_issue_row(repo.find_issue(*number)?),
        EntryId::Empty { .. } => render_empty_row(entry.description.as_deref()),
    })
}

/// Feed rows with a cursor marker on the selection
pub fn render_list(dash: &Dashboard, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for (index, entry) in dash.feed().iter().enumerate() {
        let Some(row) = render_entry(dash, entry, now) else {
            continue;
        };
        let marker = if index == dash.cursor() {
            "›".bold().to_string()
        } else {
            " ".to_string()
        };
        out.push_str(&format!("{} {}\n", marker, row));
    }
    out
}

// =============================================================================
// Grid
// =============================================================================

/// Uncoloured card lines for the activity grid.
pub fn card_lines(repo: &RepositorySummary) -> Vec<String> {
    let tags = [repo.language.clone(), repo.cloud_env()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let mut counts = Vec::new();
    if repo.open_issues_count > 0 {
        counts.push(format!("{} issues", repo.open_issues_count));
    }
    if repo.pr_count() > 0 {
        counts.push(format!("{} PRs", repo.pr_count()));
    }
    let counts = if counts.is_empty() {
        "No issues or PRs".to_string()
    } else {
        counts.join(", ")
    };

    let git = if repo.local_path.is_none() {
        "remote".to_string()
    } else if repo.has_uncommitted_changes {
        "✱ uncommitted".to_string()
    } else {
        repo.current_branch.clone().unwrap_or_default()
    };

    let sonar = match repo.gate() {
        Some(GateStatus::Error) => "✗ Sonar",
        Some(GateStatus::Warn) => "⚠ Sonar",
        Some(GateStatus::Ok) => "✓ Sonar",
        _ if repo.sonar_status.is_none() && repo.sonar_checked => "No Sonar",
        _ => "",
    };
    let footer = [sonar, activity_label(repo).unwrap_or("")]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    vec![repo.name.clone(), tags, counts, git, footer]
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Cards laid out [`GRID_COLUMNS`] to a row, selection bracketed
pub fn render_grid(dash: &Dashboard) -> String {
    let cards: Vec<(bool, Vec<String>)> = dash
        .feed()
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let repo = dash.repos().iter().find(|r| r.name == entry.id.repo())?;
            Some((index == dash.cursor(), card_lines(repo)))
        })
        .collect();

    let mut out = String::new();
    for row in cards.chunks(GRID_COLUMNS) {
        let height = row.iter().map(|(_, lines)| lines.len()).max().unwrap_or(0);
        for line_index in 0..height {
            let cells: Vec<String> = row
                .iter()
                .map(|(selected, lines)| {
                    let text = lines.get(line_index).map(String::as_str).unwrap_or("");
                    let padded = format!("{:<width$}", truncate(text, CARD_WIDTH), width = CARD_WIDTH);
                    let frame = if *selected { "┃" } else { "│" };
                    let cell = if line_index == 0 {
                        padded.bold().to_string()
                    } else {
                        padded
                    };
                    format!("{} {}", frame, cell)
                })
                .collect();
            out.push_str(cells.join(" ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// List or grid, depending on the current view
pub fn render_dashboard(dash: &Dashboard, now: DateTime<Utc>) -> String {
    match dash.view() {
        SortView::Attention => render_list(dash, now),
        SortView::Activity => render_grid(dash),
    }
}

// =============================================================================
// Detail panes
// =============================================================================

fn review_label(decision: ReviewDecision) -> &'static str {
    match decision {
        ReviewDecision::Approved => "approved",
        ReviewDecision::ChangesRequested => "changes requested",
        ReviewDecision::ReviewRequired => "review required",
        ReviewDecision::None => "none",
    }
}

fn mergeable_label(mergeable: Mergeable) -> &'static str {
    match mergeable {
        Mergeable::Mergeable => "mergeable",
        Mergeable::Conflicting => "conflicting",
        Mergeable::Unknown => "unknown",
    }
}

fn checks_label(checks: ChecksStatus) -> ColoredString {
    match checks {
        ChecksStatus::Success => "passing".green(),
        ChecksStatus::Failure => "failing".red(),
        ChecksStatus::Pending => "pending".yellow(),
        ChecksStatus::None => "none".dimmed(),
    }
}

pub fn render_pr_detail(repo: &RepositorySummary, pr: &PullRequest, index: usize, total: usize) -> String {
    let mut out = format!(
        "{} {}  {}\n",
        format!("PR #{}", pr.number).green().bold(),
        pr.title.bold(),
        format!("({}/{} in {})", index + 1, total, repo.name).dimmed()
    );
    if pr.draft {
        out.push_str(&format!("  {}\n", "draft".dimmed()));
    }
    out.push_str(&format!("  Author:    {}\n", pr.author.display_name()));
    if let (Some(head), Some(base)) = (&pr.head_ref, &pr.base_ref) {
        out.push_str(&format!("  Branch:    {} → {}\n", head, base));
    }
    out.push_str(&format!("  Review:    {}\n", review_label(pr.review_decision)));
    out.push_str(&format!("  Mergeable: {}\n", mergeable_label(pr.mergeable)));
    out.push_str(&format!("  Checks:    {}\n", checks_label(pr.checks)));
    if let Some(reviewers) = pr.reviewers.as_ref().filter(|r| !r.is_empty()) {
        out.push_str(&format!("  Reviewers: {}\n", reviewers.join(", ")));
    }
    if !pr.labels.is_empty() {
        out.push_str(&format!("  Labels:    {}\n", pr.labels.join(", ")));
    }
    if let Some(created) = pr.created_at {
        out.push_str(&format!("  Created:   {}\n", created.format("%Y-%m-%d %H:%M")));
    }
    if let Some(updated) = pr.updated_at {
        out.push_str(&format!("  Updated:   {}\n", updated.format("%Y-%m-%d %H:%M")));
    }
    out.push_str(&format!("  {}\n", pr.url.blue()));
    if !pr.body.trim().is_empty() {
        out.push('\n');
        out.push_str(pr.body.trim());
        out.push('\n');
    }
    out
}

pub fn render_issue_detail(repo: &RepositorySummary, issue: &Issue, index: usize, total: usize) -> String {
    let mut out = format!(
        "{} {}  {}\n",
        format!("#{}", issue.number).bold(),
        issue.title.bold(),
        format!("({}/{} in {})", index + 1, total, repo.name).dimmed()
    );
    if let Some(assignee) = &issue.assignee {
        out.push_str(&format!("  Assignee: {}\n", assignee));
    }
    if !issue.labels.is_empty() {
        out.push_str(&format!("  Labels:   {}\n", issue.labels.join(", ")));
    }
    out.push_str(&format!("  {}\n", issue.url.blue()));
    if !issue.body.trim().is_empty() {
        out.push('\n');
        out.push_str(issue.body.trim());
        out.push('\n');
    }
    out
}

pub const HELP: &str = "\
Navigation
  j / k        down / up
  h / l        left / right (grid)
  x            expand / collapse repository
  1 / 2        attention list / activity grid
Actions
  e            details (n / p to step, b to go back)
  o            open in browser
  c            launch assistant
  r / R        refresh selected / all
  s / S        quality gate for selected / all
  ?            this help
  q            quit";
