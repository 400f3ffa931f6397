use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repodash::feed::SortView;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Dashboard for your GitHub repositories", long_about = None)]
struct Cli {
    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Dash {
        /// Check quality gates during the initial load
        #[arg(long)]
        quality: bool,
    },

    /// Load once and print the feed
    List {
        /// Check quality gates for every repository
        #[arg(long)]
        quality: bool,

        /// Sort view (attention, activity)
        #[arg(long, default_value = "attention")]
        view: SortView,

        /// Repositories to show expanded
        #[arg(long = "expand", value_name = "NAME")]
        expand: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Launch the assistant in a repository's local clone
    Launch {
        /// Repository name
        repo: String,

        /// Work on an issue
        #[arg(long, conflicts_with = "pr")]
        issue: Option<u64>,

        /// Work on a pull request
        #[arg(long)]
        pr: Option<u64>,
    },

    /// Resolve the quality gate for a repository
    Quality {
        /// Repository owner
        owner: String,

        /// Repository name
        repo: String,
    },

    /// Show or initialize the configuration
    Config {
        /// Write a default config file
        #[arg(long)]
        init: bool,
    },

    /// Check external tools and configuration
    Doctor,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "repodash=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("REPODASH_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::Dash { quality: false }) {
        Commands::Dash { quality } => {
            commands::dash::execute(quality)?;
        }
        Commands::List {
            quality,
            view,
            expand,
            json,
        } => {
            commands::list::execute(quality, view, expand, json)?;
        }
        Commands::Launch { repo, issue, pr } => {
            commands::launch::execute(commands::launch::LaunchOptions { repo, issue, pr })?;
        }
        Commands::Quality { owner, repo } => {
            commands::quality::execute(&owner, &repo)?;
        }
        Commands::Config { init } => {
            commands::config::execute(init)?;
        }
        Commands::Doctor => {
            let code = commands::doctor::execute()?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
