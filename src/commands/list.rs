//! List command - one aggregation pass, printed as the dashboard feed

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use repodash::config;
use repodash::dashboard::Dashboard;
use repodash::feed::{FeedEntry, SortView};
use repodash::pipeline::Aggregator;
use repodash::render;
use repodash::summary::RepositorySummary;

#[derive(Serialize)]
struct ListOutput<'a> {
    view: SortView,
    status: String,
    feed: &'a [FeedEntry],
    repositories: &'a [RepositorySummary],
}

pub fn execute(quality: bool, view: SortView, expand: Vec<String>, json: bool) -> Result<()> {
    let (config, notice) = config::load();
    if let Some(notice) = &notice {
        eprintln!("{}", notice);
    }

    let aggregator = Aggregator::from_config(config)?;
    let mut on_progress = |done: usize, total: usize, label: &str| {
        if !json {
            eprintln!("  {}/{} repositories ({})", done, total, label);
        }
    };
    let repos = aggregator.fetch_all(quality, &mut on_progress);

    let mut dash = Dashboard::with_view(view);
    dash.apply_full_refresh(repos);
    for name in &expand {
        if !dash.expand(name) {
            eprintln!("⚠️  Unknown repository: {}", name);
        }
    }
    if let Some(notice) = notice {
        dash.set_status(notice);
    }

    if json {
        let output = ListOutput {
            view: dash.view(),
            status: dash.status_line(),
            feed: dash.feed(),
            repositories: dash.repos(),
        };
        let rendered =
            serde_json::to_string_pretty(&output).context("Failed to serialize feed")?;
        println!("{}", rendered);
        return Ok(());
    }

    print!("{}", render::render_dashboard(&dash, Utc::now()));
    println!("{}", dash.status_line());
    Ok(())
}
