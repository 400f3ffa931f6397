//! Internal implementation for the aggregation pipeline

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use super::{filter_repositories, Progress, Sources, BATCH_SIZE};
use crate::config::Config;
use crate::forge::RepoListing;
use crate::git::LocalState;
use crate::quality::{self, QualityGateStatus};
use crate::summary::RepositorySummary;

/// Concurrent source calls per repository: issues, PRs, local state, quality gate
const CALLS_PER_REPO: usize = 4;

/// Runs aggregation passes against a fixed set of sources.
///
/// Holds no summaries of its own; every pass returns a fresh list for the
/// caller to swap in.
///
/// Source calls block on subprocesses and HTTP, so batches run on a
/// dedicated pool sized for a full batch rather than on rayon's
/// CPU-sized global pool.
pub struct Aggregator {
    sources: Sources,
    config: Config,
    pool: ThreadPool,
}

impl Aggregator {
    pub fn new(sources: Sources, config: Config) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(BATCH_SIZE * CALLS_PER_REPO)
            .thread_name(|i| format!("repodash-io-{}", i))
            .build()
            .context("Failed to start aggregation thread pool")?;
        Ok(Self {
            sources,
            config,
            pool,
        })
    }

    /// Production sources built from config
    pub fn from_config(config: Config) -> Result<Self> {
        let sources = Sources::from_config(&config)?;
        Self::new(sources, config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full pass over every listed repository that passes the filter.
    pub fn fetch_all(&self, check_quality: bool, on_progress: Progress<'_>) -> Vec<RepositorySummary> {
        let listings = self
            .sources
            .forge
            .list_repositories(self.config.github_org());
        let listings = filter_repositories(&self.config, listings);
        let total = listings.len();
        debug!(total, check_quality, "starting full refresh");

        let mut summaries = Vec::with_capacity(total);
        for (index, batch) in listings.chunks(BATCH_SIZE).enumerate() {
            let results: Vec<RepositorySummary> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|listing| self.summarize(listing, check_quality))
                    .collect()
            });
            summaries.extend(results);

            let label = format!("batch {}", index + 1);
            info!(batch = %label, completed = summaries.len(), total, "batch complete");
            on_progress(summaries.len(), total, &label);
        }

        summaries
    }

    /// Refresh a single repository.
    ///
    /// Listing details come from the forge; when that lookup fails a minimal
    /// listing with issues enabled stands in.
    pub fn fetch_one(&self, owner: &str, repo: &str, check_quality: bool) -> RepositorySummary {
        let listing = self
            .sources
            .forge
            .view_repository(owner, repo)
            .unwrap_or_else(|| RepoListing::minimal(owner, repo));
        self.pool.install(|| self.summarize(&listing, check_quality))
    }

    /// Resolve the quality gate for every summary.
    ///
    /// Returns new summaries, all marked checked; everything else is copied.
    pub fn check_quality_all(
        &self,
        repos: &[RepositorySummary],
        on_progress: Progress<'_>,
    ) -> Vec<RepositorySummary> {
        let total = repos.len();
        let mut checked = Vec::with_capacity(total);

        for (index, batch) in repos.chunks(BATCH_SIZE).enumerate() {
            let results: Vec<RepositorySummary> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|repo| {
                        let mut updated = repo.clone();
                        updated.sonar_status = self.resolve_quality(&repo.owner, &repo.name);
                        updated.sonar_checked = true;
                        updated
                    })
                    .collect()
            });
            checked.extend(results);

            let label = format!("batch {}", index + 1);
            info!(batch = %label, completed = checked.len(), total, "quality batch complete");
            on_progress(checked.len(), total, &label);
        }

        checked
    }

    fn summarize(&self, listing: &RepoListing, check_quality: bool) -> RepositorySummary {
        let owner = listing.owner.as_str();
        let name = listing.name.as_str();
        let local_path = self.config.local_path_for(name);

        let ((issues, pull_requests), (local, gate)) = rayon::join(
            || {
                rayon::join(
                    || {
                        if listing.has_issues_enabled {
                            self.sources.forge.list_open_issues(owner, name)
                        } else {
                            Vec::new()
                        }
                    },
                    || self.sources.forge.list_open_pull_requests(owner, name),
                )
            },
            || {
                rayon::join(
                    || {
                        local_path
                            .as_deref()
                            .map(|path| self.sources.prober.probe(path))
                            .unwrap_or_default()
                    },
                    || check_quality.then(|| self.resolve_quality(owner, name)),
                )
            },
        );

        let LocalState {
            has_uncommitted_changes,
            current_branch,
        } = local;

        let mut summary = RepositorySummary::from_listing(listing);
        summary.local_path = local_path;
        summary.has_uncommitted_changes = has_uncommitted_changes;
        summary.current_branch = current_branch;
        summary.set_issues(issues);
        summary.pull_requests = Some(pull_requests);
        summary.details_loaded = true;
        if let Some(status) = gate {
            summary.sonar_status = status;
            summary.sonar_checked = true;
        }
        summary
    }

    fn resolve_quality(&self, owner: &str, name: &str) -> Option<QualityGateStatus> {
        let keys = quality::guess_project_keys(owner, name, self.config.sonar_org());
        quality::resolve(self.sources.quality.as_ref(), &keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::{ForgeReader, Issue, IssueState, PullRequest};
    use crate::git::LocalProber;
    use crate::quality::{GateStatus, QualityGateSource};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    struct FakeForge {
        listings: Vec<RepoListing>,
        issue_calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeForge {
        fn with_names(names: &[&str]) -> Self {
            Self {
                listings: names.iter().map(|n| RepoListing::minimal("acme", n)).collect(),
                issue_calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    fn issue(number: u64) -> Issue {
        Issue {
            number,
            title: format!("issue {}", number),
            url: String::new(),
            labels: Vec::new(),
            state: IssueState::Open,
            body: String::new(),
            assignee: None,
        }
    }

    impl ForgeReader for FakeForge {
        fn list_repositories(&self, _org: Option<&str>) -> Vec<RepoListing> {
            self.listings.clone()
        }

        fn view_repository(&self, _owner: &str, name: &str) -> Option<RepoListing> {
            self.listings.iter().find(|l| l.name == name).cloned()
        }

        fn list_open_issues(&self, _owner: &str, name: &str) -> Vec<Issue> {
            self.issue_calls.lock().unwrap().push(name.to_string());
            // "broken" simulates a tracker that always fails
            if name == "broken" {
                return Vec::new();
            }
            (1..=name.len() as u64).map(issue).collect()
        }

        fn list_open_pull_requests(&self, _owner: &str, _name: &str) -> Vec<PullRequest> {
            Vec::new()
        }
    }

    struct FakeGate;

    impl QualityGateSource for FakeGate {
        fn project_status(&self, project_key: &str) -> Option<QualityGateStatus> {
            (project_key == "widget").then(|| QualityGateStatus {
                project_key: project_key.to_string(),
                status: GateStatus::Error,
                url: String::new(),
                conditions: Vec::new(),
            })
        }
    }

    struct DirtyProber;

    impl LocalProber for DirtyProber {
        fn probe(&self, _path: &Path) -> LocalState {
            LocalState {
                has_uncommitted_changes: true,
                current_branch: Some("main".to_string()),
            }
        }
    }

    fn aggregator(forge: FakeForge, config: Config) -> Aggregator {
        Aggregator::new(
            Sources {
                forge: Box::new(forge),
                quality: Box::new(FakeGate),
                prober: Box::new(DirtyProber),
            },
            config,
        )
        .unwrap()
    }

    fn no_local() -> Config {
        Config {
            local_code_path: "/nonexistent/repodash-code".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_progress_fires_per_batch_with_cumulative_count() {
        let names: Vec<String> = (0..23).map(|i| format!("repo{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let agg = aggregator(FakeForge::with_names(&refs), no_local());

        let mut calls = Vec::new();
        let repos = agg.fetch_all(false, &mut |done, total, label| {
            calls.push((done, total, label.to_string()));
        });

        assert_eq!(
            calls,
            vec![
                (10, 23, "batch 1".to_string()),
                (20, 23, "batch 2".to_string()),
                (23, 23, "batch 3".to_string()),
            ]
        );
        let order: Vec<_> = repos.iter().map(|r| r.name.clone()).collect();
        assert_eq!(order, names);
    }

    /// Forge whose issue and PR calls block, recording how many overlap
    struct SlowForge {
        listings: Vec<RepoListing>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowForge {
        fn call(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl ForgeReader for Arc<SlowForge> {
        fn list_repositories(&self, _org: Option<&str>) -> Vec<RepoListing> {
            self.listings.clone()
        }

        fn view_repository(&self, _owner: &str, _name: &str) -> Option<RepoListing> {
            None
        }

        fn list_open_issues(&self, _owner: &str, _name: &str) -> Vec<Issue> {
            self.call();
            Vec::new()
        }

        fn list_open_pull_requests(&self, _owner: &str, _name: &str) -> Vec<PullRequest> {
            self.call();
            Vec::new()
        }
    }

    #[test]
    fn test_batch_runs_blocking_calls_concurrently() {
        let forge = Arc::new(SlowForge {
            listings: (0..BATCH_SIZE)
                .map(|i| RepoListing::minimal("acme", &format!("repo{}", i)))
                .collect(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let agg = Aggregator::new(
            Sources {
                forge: Box::new(Arc::clone(&forge)),
                quality: Box::new(FakeGate),
                prober: Box::new(DirtyProber),
            },
            no_local(),
        )
        .unwrap();

        let started = Instant::now();
        let repos = agg.fetch_all(false, &mut |_, _, _| {});

        assert_eq!(repos.len(), BATCH_SIZE);
        assert!(
            forge.peak.load(Ordering::SeqCst) >= BATCH_SIZE,
            "peak in-flight calls: {}",
            forge.peak.load(Ordering::SeqCst)
        );
        // Serial would take 2 * BATCH_SIZE * 200ms
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_empty_listing_fires_no_progress() {
        let agg = aggregator(FakeForge::with_names(&[]), no_local());
        let mut fired = false;
        let repos = agg.fetch_all(false, &mut |_, _, _| fired = true);
        assert!(repos.is_empty());
        assert!(!fired);
    }

    #[test]
    fn test_issues_skipped_when_disabled() {
        let mut forge = FakeForge::with_names(&["quiet", "busy"]);
        forge.listings[0].has_issues_enabled = false;
        let calls = Arc::clone(&forge.issue_calls);
        let agg = aggregator(forge, no_local());

        let repos = agg.fetch_all(false, &mut |_, _, _| {});
        assert_eq!(repos[0].open_issues_count, 0);
        assert_eq!(repos[1].open_issues_count, 4);

        assert_eq!(*calls.lock().unwrap(), vec!["busy"]);
    }

    #[test]
    fn test_failed_source_degrades_to_empty() {
        let agg = aggregator(FakeForge::with_names(&["broken", "ok"]), no_local());
        let repos = agg.fetch_all(false, &mut |_, _, _| {});

        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].open_issues_count, 0);
        assert_eq!(repos[1].open_issues_count, 2);
        assert!(repos.iter().all(|r| r.details_loaded));
        assert!(repos.iter().all(|r| r.pull_requests.is_some()));
    }

    #[test]
    fn test_full_refresh_without_quality_is_unchecked() {
        let agg = aggregator(FakeForge::with_names(&["widget"]), no_local());
        let repos = agg.fetch_all(false, &mut |_, _, _| {});
        assert!(!repos[0].sonar_checked);
        assert!(repos[0].sonar_status.is_none());
    }

    #[test]
    fn test_full_refresh_with_quality() {
        let agg = aggregator(FakeForge::with_names(&["widget", "other"]), no_local());
        let repos = agg.fetch_all(true, &mut |_, _, _| {});

        assert!(repos[0].sonar_checked);
        assert_eq!(repos[0].gate(), Some(GateStatus::Error));
        assert!(repos[1].sonar_checked);
        assert!(repos[1].sonar_status.is_none());
    }

    #[test]
    fn test_local_state_only_for_local_clone() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("widget")).unwrap();
        let config = Config {
            local_code_path: tmp.path().display().to_string(),
            ..Default::default()
        };
        let agg = aggregator(FakeForge::with_names(&["widget", "remote"]), config);

        let repos = agg.fetch_all(false, &mut |_, _, _| {});
        assert_eq!(repos[0].local_path, Some(tmp.path().join("widget")));
        assert!(repos[0].has_uncommitted_changes);
        assert_eq!(repos[0].current_branch.as_deref(), Some("main"));

        assert!(repos[1].local_path.is_none());
        assert!(!repos[1].has_uncommitted_changes);
        assert!(repos[1].current_branch.is_none());
    }

    #[test]
    fn test_fetch_all_applies_filter() {
        let config = Config {
            included_repos: vec!["b".to_string()],
            ..no_local()
        };
        let agg = aggregator(FakeForge::with_names(&["a", "b", "c"]), config);
        let repos = agg.fetch_all(false, &mut |_, _, _| {});
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "b");
    }

    #[test]
    fn test_fetch_one_falls_back_to_minimal_listing() {
        let agg = aggregator(FakeForge::with_names(&[]), no_local());
        let repo = agg.fetch_one("acme", "ghost", false);

        assert_eq!(repo.url, "https://github.com/acme/ghost");
        // issues enabled on the fallback, so the tracker was asked
        assert_eq!(repo.open_issues_count, 5);
        assert!(!repo.sonar_checked);
    }

    #[test]
    fn test_fetch_one_with_quality() {
        let agg = aggregator(FakeForge::with_names(&["widget"]), no_local());
        let repo = agg.fetch_one("acme", "widget", true);
        assert!(repo.sonar_checked);
        assert_eq!(repo.sonar_status.unwrap().project_key, "widget");
    }

    #[test]
    fn test_check_quality_all_marks_every_repo() {
        let agg = aggregator(FakeForge::with_names(&["widget", "other"]), no_local());
        let repos = agg.fetch_all(false, &mut |_, _, _| {});

        let mut batches = 0;
        let checked = agg.check_quality_all(&repos, &mut |_, _, _| batches += 1);

        assert_eq!(batches, 1);
        assert!(checked.iter().all(|r| r.sonar_checked));
        assert_eq!(checked[0].gate(), Some(GateStatus::Error));
        assert!(checked[1].sonar_status.is_none());
        assert_eq!(checked[0].open_issues_count, repos[0].open_issues_count);
    }
}
