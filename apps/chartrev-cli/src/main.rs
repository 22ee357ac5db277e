//! # chartrev-cli
//!
//! Command-line interface for chartrev.
//!
//! Drives the revision engine against the JSON-backed store under
//! `<project>/.chartrev/`:
//! - `chartrev workspace create/list/show/add-chart/add-file` — seed workspaces
//! - `chartrev plan create/attach/list/show` — record plans and their patches
//! - `chartrev revision create/list/rollback` — materialize plans, roll back
//! - `chartrev patch accept/reject/accept-all/reject-all` — resolve patches
//! - `chartrev history show/verify` — inspect the content history

mod commands;

use std::path::PathBuf;

use chartrev_engine::{Actor, Engine, EngineConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// chartrev — review and reconcile proposed changes to chart workspaces.
#[derive(Parser)]
#[command(name = "chartrev", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Acting user (defaults to `default_actor` from config).
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and inspect workspaces, charts and files.
    Workspace {
        #[command(subcommand)]
        command: commands::workspace::WorkspaceCommands,
    },
    /// Record plans and attach proposed patches.
    Plan {
        #[command(subcommand)]
        command: commands::plan::PlanCommands,
    },
    /// Materialize plans into revisions and roll back.
    Revision {
        #[command(subcommand)]
        command: commands::revision::RevisionCommands,
    },
    /// Accept or reject pending patches.
    Patch {
        #[command(subcommand)]
        command: commands::patch::PatchCommands,
    },
    /// Inspect and verify content history.
    History {
        #[command(subcommand)]
        command: commands::history::HistoryCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("chartrev_engine=info".parse()?)
                .add_directive("chartrev_store=info".parse()?)
                .add_directive("chartrev_plan=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = EngineConfig::load(&project_root)?;
    tracing::debug!(data_dir = %config.data_dir.display(), "config loaded");
    let actor = cli
        .actor
        .map(Actor::new)
        .unwrap_or_else(|| Actor::new(config.default_actor.clone()));
    let engine = Engine::open(config)?;

    match &cli.command {
        Commands::Workspace { command } => commands::workspace::execute(command, &engine, &actor),
        Commands::Plan { command } => commands::plan::execute(command, &engine, &actor),
        Commands::Revision { command } => commands::revision::execute(command, &engine, &actor),
        Commands::Patch { command } => commands::patch::execute(command, &engine, &actor),
        Commands::History { command } => commands::history::execute(command, &engine),
    }
}
