//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pivot_core::config::Config;
use pivot_core::{TreeFilter, logging};

mod commands;

#[derive(Parser)]
#[command(name = "pivot")]
#[command(version)]
#[command(about = "Inspect branching agent sessions and recorded event streams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $PIVOT_HOME/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "PIVOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List session files, newest first
    Sessions {
        /// Directory to scan (default: configured sessions directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Print the conversation tree of a session file
    Tree {
        /// Session file (JSONL)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Active leaf (default: last entry)
        #[arg(long, value_name = "ID")]
        leaf: Option<String>,

        /// Row filter: default, no-tools, user-only, labeled-only, all
        #[arg(long, value_name = "MODE", value_parser = parse_filter)]
        filter: Option<TreeFilter>,

        /// Print rows as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the transcript of the active branch
    Show {
        /// Session file (JSONL)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Active leaf (default: last entry)
        #[arg(long, value_name = "ID")]
        leaf: Option<String>,
    },

    /// Fold a recorded agent event stream into a transcript
    Fold {
        /// Event stream (one JSON event per line)
        #[arg(value_name = "EVENTS")]
        events: PathBuf,

        /// Print display messages as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_filter(value: &str) -> std::result::Result<TreeFilter, String> {
    TreeFilter::parse(value).ok_or_else(|| {
        let modes: Vec<&str> = TreeFilter::ALL.into_iter().map(TreeFilter::as_str).collect();
        format!("unknown filter '{value}' (expected one of: {})", modes.join(", "))
    })
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("load config")?;
    let _log_guard = logging::init(&config.log).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli.command, &config).await })
}

async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Sessions { dir } => commands::sessions::list(dir, config),
        Commands::Tree {
            file,
            leaf,
            filter,
            json,
        } => commands::tree::print(
            &file,
            &commands::tree::TreeOptions {
                leaf: leaf.as_deref(),
                filter: filter.unwrap_or(config.tree.filter),
                show_labels: config.tree.show_labels,
                preview_max_chars: config.preview_max_chars,
                json,
            },
        ),
        Commands::Show { file, leaf } => commands::show::run(&file, leaf.as_deref()).await,
        Commands::Fold { events, json } => commands::fold::run(&events, json),
    }
}
