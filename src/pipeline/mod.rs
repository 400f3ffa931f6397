//! Aggregation pipeline - per-repository status from every source
//!
//! "Do X": Turn a repository listing into a list of [`RepositorySummary`].
//!
//! Repositories are filtered by config, then fetched in batches of
//! [`BATCH_SIZE`]. Batches run one after another; repositories in a batch run
//! in parallel, and each repository's issue, PR, local and quality lookups
//! run in parallel too. Output order always follows listing order.
//!
//! A pass never fails. Every source degrades to "no data" on its own, so a
//! broken issue tracker costs one repository its issue count and nothing
//! more.
//!
//! # Example
//!
//! ```no_run
//! use repodash::config;
//! use repodash::pipeline::Aggregator;
//!
//! let (cfg, _) = config::load();
//! let aggregator = Aggregator::from_config(cfg)?;
//! let repos = aggregator.fetch_all(false, &mut |done, total, label| {
//!     eprintln!("{}/{} ({})", done, total, label);
//! });
//! println!("{} repositories", repos.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

mod internal;

use anyhow::Result;

use crate::config::Config;
use crate::forge::{ForgeReader, GitHubReader, RepoListing};
use crate::git::{GitProber, LocalProber};
use crate::quality::{QualityGateSource, SonarClient};

pub use internal::Aggregator;

/// Repositories fetched concurrently per batch
pub const BATCH_SIZE: usize = 10;

/// Progress callback: `(completed, total, batch_label)`, fired once per batch
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize, &str);

/// The external sources a pass reads from.
pub struct Sources {
    pub forge: Box<dyn ForgeReader>,
    pub quality: Box<dyn QualityGateSource>,
    pub prober: Box<dyn LocalProber>,
}

impl Sources {
    /// `gh` CLI, SonarCloud web API and `git` CLI
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            forge: Box::new(GitHubReader::new()),
            quality: Box::new(SonarClient::new(&config.sonar.url, config.sonar_token())?),
            prober: Box::new(GitProber),
        })
    }
}

/// Apply the repository filter, keeping listing order.
pub fn filter_repositories(config: &Config, listings: Vec<RepoListing>) -> Vec<RepoListing> {
    listings
        .into_iter()
        .filter(|l| config.includes(&l.name))
        .collect()
}
