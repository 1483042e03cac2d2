//! cukemirror command-line entry point.
//!
//! Stands in for an HTTP layer: every subcommand resolves a user, runs one
//! refresh or query against the local mirror, and prints a JSON envelope.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use cukemirror::config::{MirrorConfig, Overrides};
use cukemirror::ReplaceStrategy;
use cukemirror_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "cukemirror", version, about = "Local mirror of Cucumber Studio folders and scenarios")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Mirror database path
    #[arg(long, global = true, env = "CUKEMIRROR_DB")]
    db: Option<PathBuf>,

    /// Cucumber Studio API base URL
    #[arg(long, global = true, env = "CUKEMIRROR_BASE_URL")]
    base_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, global = true, env = "CUKEMIRROR_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Snapshot replacement strategy: atomic or best-effort
    #[arg(long, global = true, value_parser = parse_strategy)]
    strategy: Option<ReplaceStrategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage local users and their Cucumber Studio credentials
    User {
        #[command(subcommand)]
        action: cli::user::UserAction,
    },

    /// Refresh or list a user's Cucumber Studio projects
    Projects {
        #[command(subcommand)]
        action: cli::projects::ProjectsAction,
    },

    /// Refresh folders or print the folder tree of a project
    Folders {
        #[command(subcommand)]
        action: cli::folders::FoldersAction,
    },

    /// Refresh or query scenarios of a project
    Scenarios {
        #[command(subcommand)]
        action: cli::scenarios::ScenariosAction,
    },

    /// Show resolved configuration
    Config(cli::config::ConfigArgs),
}

fn parse_strategy(raw: &str) -> std::result::Result<ReplaceStrategy, String> {
    ReplaceStrategy::parse(raw).ok_or_else(|| format!("unknown strategy '{raw}' (atomic, best-effort)"))
}

async fn run_command(command: Commands, config: MirrorConfig) -> Result<()> {
    match command {
        Commands::Config(args) => cli::config::run(args, &config),
        Commands::User { action } => {
            let ctx = cli::Context::open(config).await?;
            cli::user::run(&ctx, action).await
        }
        Commands::Projects { action } => {
            let ctx = cli::Context::open(config).await?;
            cli::projects::run(&ctx, action).await
        }
        Commands::Folders { action } => {
            let ctx = cli::Context::open(config).await?;
            cli::folders::run(&ctx, action).await
        }
        Commands::Scenarios { action } => {
            let ctx = cli::Context::open(config).await?;
            cli::scenarios::run(&ctx, action).await
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = MirrorConfig::resolve(Overrides {
        db_path: cli.db,
        base_url: cli.base_url,
        timeout_secs: cli.timeout_secs,
        strategy: cli.strategy,
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run_command(cli.command, config))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "cukemirror",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Command failed: {:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
