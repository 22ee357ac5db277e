// workspace.rs — Workspace subcommands: create, list, show, add-chart, add-file.

use std::path::PathBuf;

use chartrev_engine::{Actor, Engine};
use clap::Subcommand;
use uuid::Uuid;

use super::{print_files, read_content};

#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Create an empty workspace at revision 0.
    Create {
        /// Workspace name.
        name: String,
    },
    /// List all workspaces.
    List,
    /// Show a workspace with its charts and files.
    Show {
        /// Workspace ID.
        id: Uuid,
    },
    /// Add a chart to a workspace.
    AddChart {
        /// Workspace ID.
        workspace: Uuid,
        /// Chart name.
        name: String,
    },
    /// Add a file to a chart, or as a loose file.
    AddFile {
        /// Workspace ID.
        workspace: Uuid,
        /// File path, relative to the chart.
        path: String,
        /// Owning chart (omit for a loose workspace file).
        #[arg(long)]
        chart: Option<Uuid>,
        /// Initial content.
        #[arg(long)]
        content: Option<String>,
        /// Read initial content from a local file.
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
}

pub fn execute(cmd: &WorkspaceCommands, engine: &Engine, actor: &Actor) -> anyhow::Result<()> {
    match cmd {
        WorkspaceCommands::Create { name } => {
            let workspace = engine.create_workspace(name, actor)?;
            println!("Created workspace {} ({})", workspace.workspace_id, workspace.name);
        }

        WorkspaceCommands::List => {
            let workspaces = engine.store().list_workspaces();
            if workspaces.is_empty() {
                println!("No workspaces.");
                return Ok(());
            }
            println!("{:<38} {:<5} {:<20} NAME", "WORKSPACE ID", "REV", "CREATED");
            println!("{}", "-".repeat(80));
            for ws in workspaces {
                println!(
                    "{:<38} {:<5} {:<20} {}",
                    ws.workspace_id,
                    ws.current_revision,
                    ws.created_at.format("%Y-%m-%d %H:%M:%S"),
                    ws.name
                );
            }
        }

        WorkspaceCommands::Show { id } => {
            let workspace = engine.store().get_workspace(*id)?;
            let charts = engine.store().list_charts(*id)?;
            let files = engine.store().list_files(*id)?;

            println!("Workspace: {}", workspace.name);
            println!("ID:        {}", workspace.workspace_id);
            println!("Revision:  {}", workspace.current_revision);
            println!("Created:   {} by {}", workspace.created_at, workspace.created_by);
            println!();
            if charts.is_empty() {
                println!("Charts: none");
            } else {
                println!("Charts:");
                for chart in &charts {
                    println!("  {} {}", chart.chart_id, chart.name);
                }
            }
            println!();
            print_files(&files);
        }

        WorkspaceCommands::AddChart { workspace, name } => {
            let chart = engine.add_chart(*workspace, name)?;
            println!("Added chart {} ({})", chart.chart_id, chart.name);
        }

        WorkspaceCommands::AddFile {
            workspace,
            path,
            chart,
            content,
            from_file,
        } => {
            let content = read_content(content.as_deref(), from_file.as_ref())?;
            let file = engine.add_file(*workspace, *chart, path, &content)?;
            println!(
                "Added file {} ({}) at revision {}",
                file.file_id, file.file_path, file.revision_number
            );
        }
    }

    Ok(())
}
