// revision.rs — Revision subcommands: create, list, rollback.

use chartrev_engine::{Actor, Engine};
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum RevisionCommands {
    /// Materialize a plan into a new revision of pending patches.
    Create {
        /// Plan ID.
        plan: Uuid,
    },
    /// List a workspace's revisions.
    List {
        /// Workspace ID.
        workspace: Uuid,
    },
    /// Restore a workspace to the content of an earlier revision.
    Rollback {
        /// Workspace ID.
        workspace: Uuid,
        /// Revision whose content to restore.
        target: u64,
    },
}

pub fn execute(cmd: &RevisionCommands, engine: &Engine, actor: &Actor) -> anyhow::Result<()> {
    match cmd {
        RevisionCommands::Create { plan } => {
            let revision = engine.revisions().create_revision(*plan, actor)?;
            println!(
                "Revision {} created from plan {}",
                revision.revision_number, plan
            );
        }

        RevisionCommands::List { workspace } => {
            let revisions = engine.revisions().list_revisions(*workspace)?;
            println!("{:<5} {:<16} {:<12} {:<20} PLAN", "REV", "KIND", "BY", "CREATED");
            println!("{}", "-".repeat(90));
            for revision in &revisions {
                println!(
                    "{:<5} {:<16} {:<12} {:<20} {}",
                    revision.revision_number,
                    revision.kind.to_string(),
                    revision.created_by,
                    revision.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    revision
                        .plan_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        RevisionCommands::Rollback { workspace, target } => {
            let ws = engine
                .revisions()
                .rollback_to_revision(*workspace, *target, actor)?;
            println!(
                "Workspace {} restored to revision {} content (now at revision {})",
                ws.workspace_id, target, ws.current_revision
            );
        }
    }

    Ok(())
}
