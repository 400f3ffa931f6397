//! Internal implementation for the dash command
//!
//! One channel carries everything the shell reacts to: input lines from a
//! reader thread and results from refresh workers. Only the main loop
//! touches the [`Dashboard`].

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tracing::debug;

use repodash::config;
use repodash::dashboard::{Dashboard, DetailTarget, RefreshGate, RefreshPermit};
use repodash::feed::SortView;
use repodash::launcher;
use repodash::pipeline::Aggregator;
use repodash::render;
use repodash::summary::RepositorySummary;

const BUSY: &str = "Refresh already in progress";

/// Everything the main loop reacts to
#[derive(Debug)]
enum Event {
    Line(String),
    InputClosed,
    Progress {
        done: usize,
        total: usize,
        label: String,
    },
    Loaded(Vec<RepositorySummary>),
    Refreshed(RepositorySummary),
    QualityChecked(Vec<RepositorySummary>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Down,
    Up,
    Left,
    Right,
    Toggle,
    View(SortView),
    Details,
    Next,
    Previous,
    Back,
    Open,
    Launch,
    Refresh,
    RefreshAll,
    Quality,
    QualityAll,
    Help,
    Quit,
}

impl Action {
    fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'j' => Action::Down,
            'k' => Action::Up,
            'h' => Action::Left,
            'l' => Action::Right,
            'x' => Action::Toggle,
            '1' => Action::View(SortView::Attention),
            '2' => Action::View(SortView::Activity),
            'e' => Action::Details,
            'n' => Action::Next,
            'p' => Action::Previous,
            'b' => Action::Back,
            'o' => Action::Open,
            'c' => Action::Launch,
            'r' => Action::Refresh,
            'R' => Action::RefreshAll,
            's' => Action::Quality,
            'S' => Action::QualityAll,
            '?' => Action::Help,
            'q' => Action::Quit,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailKind {
    Issue,
    PullRequest,
}

/// Which item a detail pane shows, by position in the repository's list
#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailCursor {
    repo: String,
    kind: DetailKind,
    index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Screen {
    Feed,
    Detail(DetailCursor),
    Help,
}

struct Shell {
    aggregator: Arc<Aggregator>,
    dashboard: Dashboard,
    gate: RefreshGate,
    events: Sender<Event>,
    screen: Screen,
    /// `--quality`: every refresh also resolves quality gates
    check_quality: bool,
}

/// Main loop entry point
pub fn run(check_quality: bool) -> Result<()> {
    let (config, notice) = config::load();
    let aggregator = Arc::new(Aggregator::from_config(config)?);

    let (events, inbox) = mpsc::channel();
    spawn_input_reader(events.clone());

    let mut shell = Shell::new(aggregator, events, check_quality);
    shell.refresh_all();
    if let Some(notice) = notice {
        shell.dashboard.set_status(notice);
    }
    shell.draw()?;

    for event in inbox.iter() {
        if !shell.handle(event) {
            break;
        }
        shell.draw()?;
    }
    Ok(())
}

fn spawn_input_reader(events: Sender<Event>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if events.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

impl Shell {
    fn new(aggregator: Arc<Aggregator>, events: Sender<Event>, check_quality: bool) -> Self {
        Self {
            aggregator,
            dashboard: Dashboard::new(),
            gate: RefreshGate::new(),
            events,
            screen: Screen::Feed,
            check_quality,
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Returns false when the shell should exit
    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Line(line) => {
                for key in line.chars().filter(|c| !c.is_whitespace()) {
                    match Action::from_key(key) {
                        Some(action) => {
                            if !self.act(action) {
                                return false;
                            }
                        }
                        None => self.dashboard.set_status(format!("Unknown key: {}", key)),
                    }
                }
                true
            }
            Event::InputClosed => false,
            Event::Progress { done, total, label } => {
                self.dashboard
                    .set_status(format!("Loading... {}/{} ({})", done, total, label));
                true
            }
            Event::Loaded(repos) => {
                let count = repos.len();
                self.dashboard.apply_full_refresh(repos);
                self.dashboard
                    .set_status(format!("Loaded {} repositories", count));
                true
            }
            Event::Refreshed(repo) => {
                let name = repo.name.clone();
                self.dashboard.apply_single_refresh(repo);
                self.dashboard.set_status(format!("Updated {}", name));
                true
            }
            Event::QualityChecked(repos) => {
                let found = repos.iter().filter(|r| r.sonar_status.is_some()).count();
                let total = repos.len();
                self.dashboard.apply_quality_pass(repos);
                self.dashboard
                    .set_status(format!("Quality gates: {}/{} found", found, total));
                true
            }
        }
    }

    /// Returns false on quit
    fn act(&mut self, action: Action) -> bool {
        if action == Action::Quit {
            return false;
        }

        match self.screen.clone() {
            Screen::Help => self.screen = Screen::Feed,
            Screen::Detail(cursor) => self.act_in_detail(action, cursor),
            Screen::Feed => self.act_in_feed(action),
        }
        true
    }

    fn act_in_feed(&mut self, action: Action) {
        match action {
            Action::Down => self.dashboard.move_down(),
            Action::Up => self.dashboard.move_up(),
            Action::Left => self.dashboard.move_left(),
            Action::Right => self.dashboard.move_right(),
            Action::Toggle => self.dashboard.toggle_expand(),
            Action::View(view) => self.dashboard.set_view(view),
            Action::Details => self.open_detail(),
            Action::Open => {
                if let Some(url) = self.dashboard.selected_url().map(str::to_string) {
                    let status = launcher::open_url(&url);
                    self.dashboard.set_status(status);
                }
            }
            Action::Launch => self.launch_selected(),
            Action::Refresh => self.refresh_selected(),
            Action::RefreshAll => self.refresh_all(),
            Action::Quality => self.quality_selected(),
            Action::QualityAll => self.quality_all(),
            Action::Help => self.screen = Screen::Help,
            Action::Next | Action::Previous | Action::Back | Action::Quit => {}
        }
    }

    fn act_in_detail(&mut self, action: Action, mut cursor: DetailCursor) {
        let len = self.detail_len(&cursor);
        match action {
            Action::Next | Action::Down => {
                cursor.index = (cursor.index + 1).min(len.saturating_sub(1));
                self.screen = Screen::Detail(cursor);
            }
            Action::Previous | Action::Up => {
                cursor.index = cursor.index.saturating_sub(1);
                self.screen = Screen::Detail(cursor);
            }
            Action::Back => self.screen = Screen::Feed,
            Action::Open => {
                if let Some(url) = self.detail_url(&cursor) {
                    let status = launcher::open_url(&url);
                    self.dashboard.set_status(status);
                }
            }
            Action::Launch => self.launch_detail(&cursor),
            Action::Help => self.screen = Screen::Help,
            _ => self
                .dashboard
                .set_status("n / p to step, b to go back"),
        }
    }

    // =========================================================================
    // Detail panes
    // =========================================================================

    fn open_detail(&mut self) {
        let cursor = match self.dashboard.open_detail() {
            Some(DetailTarget::PullRequest { repo, index }) => Some(DetailCursor {
                repo: repo.name.clone(),
                kind: DetailKind::PullRequest,
                index,
            }),
            Some(DetailTarget::Issue { repo, index }) => Some(DetailCursor {
                repo: repo.name.clone(),
                kind: DetailKind::Issue,
                index,
            }),
            None => None,
        };
        if let Some(cursor) = cursor {
            self.screen = Screen::Detail(cursor);
        }
    }

    fn find_repo(&self, name: &str) -> Option<&RepositorySummary> {
        self.dashboard.repos().iter().find(|r| r.name == name)
    }

    fn detail_len(&self, cursor: &DetailCursor) -> usize {
        self.find_repo(&cursor.repo)
            .map(|repo| match cursor.kind {
                DetailKind::Issue => repo.issues.len(),
                DetailKind::PullRequest => repo.pr_count(),
            })
            .unwrap_or(0)
    }

    fn detail_url(&self, cursor: &DetailCursor) -> Option<String> {
        let repo = self.find_repo(&cursor.repo)?;
        match cursor.kind {
            DetailKind::Issue => repo.issues.get(cursor.index).map(|i| i.url.clone()),
            DetailKind::PullRequest => repo
                .pull_requests
                .as_ref()?
                .get(cursor.index)
                .map(|pr| pr.url.clone()),
        }
    }

    /// `None` once a refresh has removed the item
    fn render_detail(&self, cursor: &DetailCursor) -> Option<String> {
        let repo = self.find_repo(&cursor.repo)?;
        match cursor.kind {
            DetailKind::Issue => {
                let issue = repo.issues.get(cursor.index)?;
                Some(render::render_issue_detail(
                    repo,
                    issue,
                    cursor.index,
                    repo.issues.len(),
                ))
            }
            DetailKind::PullRequest => {
                let prs = repo.pull_requests.as_ref()?;
                let pr = prs.get(cursor.index)?;
                Some(render::render_pr_detail(repo, pr, cursor.index, prs.len()))
            }
        }
    }

    // =========================================================================
    // Launching
    // =========================================================================

    fn launch_selected(&mut self) {
        let config = self.aggregator.config();
        let status = if let Some((repo, pr)) = self.dashboard.selected_pr() {
            launcher::launch(repo, None, Some(pr), config)
        } else if let Some((repo, issue)) = self.dashboard.selected_issue() {
            launcher::launch(repo, Some(issue), None, config)
        } else if let Some(repo) = self.dashboard.selected_repo() {
            launcher::launch(repo, None, None, config)
        } else {
            return;
        };
        self.dashboard.set_status(status);
    }

    fn launch_detail(&mut self, cursor: &DetailCursor) {
        let config = self.aggregator.config();
        let Some(repo) = self.find_repo(&cursor.repo) else {
            return;
        };
        let status = match cursor.kind {
            DetailKind::Issue => launcher::launch(repo, repo.issues.get(cursor.index), None, config),
            DetailKind::PullRequest => {
                let pr = repo
                    .pull_requests
                    .as_ref()
                    .and_then(|prs| prs.get(cursor.index));
                launcher::launch(repo, None, pr, config)
            }
        };
        self.dashboard.set_status(status);
    }

    // =========================================================================
    // Refresh workers
    // =========================================================================

    fn begin(&mut self) -> Option<RefreshPermit> {
        let permit = self.gate.try_begin();
        if permit.is_none() {
            debug!("refresh rejected, one already in flight");
            self.dashboard.set_status(BUSY);
        }
        permit
    }

    fn refresh_all(&mut self) {
        let Some(permit) = self.begin() else {
            return;
        };
        self.dashboard.set_status("Loading repositories...");

        let check_quality = self.check_quality;
        let aggregator = Arc::clone(&self.aggregator);
        let events = self.events.clone();
        thread::spawn(move || {
            let _permit = permit;
            let progress = events.clone();
            let mut on_progress = move |done: usize, total: usize, label: &str| {
                let _ = progress.send(Event::Progress {
                    done,
                    total,
                    label: label.to_string(),
                });
            };
            let repos = aggregator.fetch_all(check_quality, &mut on_progress);
            let _ = events.send(Event::Loaded(repos));
        });
    }

    fn refresh_selected(&mut self) {
        let Some((owner, name)) = self
            .dashboard
            .selected_repo()
            .map(|r| (r.owner.clone(), r.name.clone()))
        else {
            return;
        };
        let Some(permit) = self.begin() else {
            return;
        };
        self.dashboard.set_status(format!("Refreshing {}...", name));

        let check_quality = self.check_quality;
        let aggregator = Arc::clone(&self.aggregator);
        let events = self.events.clone();
        thread::spawn(move || {
            let _permit = permit;
            let repo = aggregator.fetch_one(&owner, &name, check_quality);
            let _ = events.send(Event::Refreshed(repo));
        });
    }

    fn quality_selected(&mut self) {
        let Some(repo) = self.dashboard.selected_repo().cloned() else {
            return;
        };
        let Some(permit) = self.begin() else {
            return;
        };
        self.dashboard
            .set_status(format!("Checking quality gate for {}...", repo.name));

        let aggregator = Arc::clone(&self.aggregator);
        let events = self.events.clone();
        thread::spawn(move || {
            let _permit = permit;
            let mut on_progress = |_: usize, _: usize, _: &str| {};
            let checked = aggregator.check_quality_all(std::slice::from_ref(&repo), &mut on_progress);
            for repo in checked {
                let _ = events.send(Event::Refreshed(repo));
            }
        });
    }

    fn quality_all(&mut self) {
        let repos = self.dashboard.repos().to_vec();
        let Some(permit) = self.begin() else {
            return;
        };
        self.dashboard.set_status("Checking quality gates...");

        let aggregator = Arc::clone(&self.aggregator);
        let events = self.events.clone();
        thread::spawn(move || {
            let _permit = permit;
            let progress = events.clone();
            let mut on_progress = move |done: usize, total: usize, label: &str| {
                let _ = progress.send(Event::Progress {
                    done,
                    total,
                    label: label.to_string(),
                });
            };
            let checked = aggregator.check_quality_all(&repos, &mut on_progress);
            let _ = events.send(Event::QualityChecked(checked));
        });
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    fn screen_text(&self) -> String {
        match &self.screen {
            Screen::Help => format!("{}\n\n{}", render::HELP, "any key to return".dimmed()),
            Screen::Detail(cursor) => match self.render_detail(cursor) {
                Some(pane) => format!("{}\n{}", pane, "n / p step · b back".dimmed()),
                None => "Item no longer open. b to go back.".to_string(),
            },
            Screen::Feed => {
                let body = render::render_dashboard(&self.dashboard, Utc::now());
                if body.is_empty() {
                    "No repositories.".dimmed().to_string()
                } else {
                    body
                }
            }
        }
    }

    fn draw(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if stdout.is_terminal() {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        writeln!(out, "{}", self.screen_text().trim_end())?;
        writeln!(out)?;
        writeln!(out, "{}", self.dashboard.status_line().dimmed())?;
        write!(out, "> ")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repodash::config::Config;
    use repodash::forge::{ForgeReader, Issue, IssueState, PullRequest, RepoListing};
    use repodash::git::{LocalProber, LocalState};
    use repodash::pipeline::Sources;
    use repodash::quality::{QualityGateSource, QualityGateStatus};
    use std::path::Path;
    use std::sync::mpsc::Receiver;

    struct EmptyForge;

    impl ForgeReader for EmptyForge {
        fn list_repositories(&self, _org: Option<&str>) -> Vec<RepoListing> {
            Vec::new()
        }
        fn view_repository(&self, _owner: &str, _name: &str) -> Option<RepoListing> {
            None
        }
        fn list_open_issues(&self, _owner: &str, _name: &str) -> Vec<Issue> {
            Vec::new()
        }
        fn list_open_pull_requests(&self, _owner: &str, _name: &str) -> Vec<PullRequest> {
            Vec::new()
        }
    }

    struct NoGate;

    impl QualityGateSource for NoGate {
        fn project_status(&self, _project_key: &str) -> Option<QualityGateStatus> {
            None
        }
    }

    struct Clean;

    impl LocalProber for Clean {
        fn probe(&self, _path: &Path) -> LocalState {
            LocalState::default()
        }
    }

    fn shell() -> (Shell, Receiver<Event>) {
        shell_with_quality(false)
    }

    fn shell_with_quality(check_quality: bool) -> (Shell, Receiver<Event>) {
        let sources = Sources {
            forge: Box::new(EmptyForge),
            quality: Box::new(NoGate),
            prober: Box::new(Clean),
        };
        let aggregator = Arc::new(Aggregator::new(sources, Config::default()).unwrap());
        let (events, inbox) = mpsc::channel();
        (Shell::new(aggregator, events, check_quality), inbox)
    }

    fn summary(name: &str) -> RepositorySummary {
        RepositorySummary::from_listing(&RepoListing::minimal("acme", name))
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Action::from_key('j'), Some(Action::Down));
        assert_eq!(Action::from_key('R'), Some(Action::RefreshAll));
        assert_eq!(Action::from_key('2'), Some(Action::View(SortView::Activity)));
        assert_eq!(Action::from_key('z'), None);
    }

    #[test]
    fn test_second_refresh_is_rejected_while_busy() {
        let (mut shell, _inbox) = shell();
        let _held = shell.gate.try_begin().unwrap();

        shell.act(Action::RefreshAll);
        assert_eq!(shell.dashboard.status(), Some(BUSY));
    }

    #[test]
    fn test_refresh_result_arrives_over_channel() {
        let (mut shell, inbox) = shell();
        shell.refresh_all();

        let event = inbox.recv().unwrap();
        assert!(matches!(event, Event::Loaded(ref repos) if repos.is_empty()));
        assert!(shell.handle(event));
        assert_eq!(shell.dashboard.status(), Some("Loaded 0 repositories"));
    }

    #[test]
    fn test_quality_mode_survives_later_refreshes() {
        let (mut shell, inbox) = shell_with_quality(true);
        shell.handle(Event::Loaded(vec![summary("a")]));

        shell.act(Action::Refresh);
        let Event::Refreshed(repo) = inbox.recv().unwrap() else {
            panic!("expected single refresh result");
        };
        assert_eq!(repo.name, "a");
        assert!(repo.sonar_checked);
    }

    #[test]
    fn test_line_runs_every_key_and_quits() {
        let (mut shell, _inbox) = shell();
        shell.handle(Event::Loaded(vec![summary("a"), summary("b")]));

        assert!(shell.handle(Event::Line("j?".to_string())));
        assert_eq!(shell.screen, Screen::Help);
        assert_eq!(
            shell.dashboard.selected_repo().map(|r| r.name.as_str()),
            Some("b")
        );

        assert!(shell.handle(Event::Line("k".to_string())));
        assert_eq!(shell.screen, Screen::Feed);
        assert!(!shell.handle(Event::Line("q".to_string())));
    }

    #[test]
    fn test_unknown_key_sets_status() {
        let (mut shell, _inbox) = shell();
        shell.handle(Event::Line("z".to_string()));
        assert_eq!(shell.dashboard.status(), Some("Unknown key: z"));
    }

    #[test]
    fn test_detail_steps_within_bounds() {
        let (mut shell, _inbox) = shell();
        let mut repo = summary("a");
        repo.set_issues(vec![issue(1), issue(2)]);
        repo.pull_requests = Some(Vec::new());
        shell.handle(Event::Loaded(vec![repo]));

        shell.act(Action::Details);
        assert!(shell.dashboard.is_expanded("a"));
        assert_eq!(shell.screen, Screen::Feed);

        shell.act(Action::Details);
        let Screen::Detail(cursor) = &shell.screen else {
            panic!("expected detail screen");
        };
        assert_eq!(cursor.kind, DetailKind::Issue);
        assert_eq!(cursor.index, 0);

        shell.act(Action::Next);
        shell.act(Action::Next);
        assert!(matches!(&shell.screen, Screen::Detail(c) if c.index == 1));

        shell.act(Action::Back);
        assert_eq!(shell.screen, Screen::Feed);
    }

    fn issue(number: u64) -> Issue {
        Issue {
            number,
            title: format!("issue {}", number),
            url: format!("https://github.com/acme/a/issues/{}", number),
            labels: Vec::new(),
            state: IssueState::Open,
            body: String::new(),
            assignee: None,
        }
    }
}
