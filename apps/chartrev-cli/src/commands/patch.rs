// patch.rs — Patch subcommands: accept, reject, accept-all, reject-all.

use chartrev_engine::{Actor, Engine};
use clap::Subcommand;
use uuid::Uuid;

use super::print_files;

#[derive(Subcommand)]
pub enum PatchCommands {
    /// Accept one file's pending patch.
    Accept {
        /// File ID.
        file: Uuid,
        /// Revision the patch is expected to be pending at.
        revision: u64,
    },
    /// Reject one file's pending patch.
    Reject {
        /// File ID.
        file: Uuid,
        /// Revision the patch is expected to be pending at.
        revision: u64,
    },
    /// Accept every patch pending at a revision.
    AcceptAll {
        /// Workspace ID.
        workspace: Uuid,
        /// Revision.
        revision: u64,
    },
    /// Reject every patch pending at a revision.
    RejectAll {
        /// Workspace ID.
        workspace: Uuid,
        /// Revision.
        revision: u64,
    },
}

pub fn execute(cmd: &PatchCommands, engine: &Engine, actor: &Actor) -> anyhow::Result<()> {
    let resolver = engine.resolver();
    let files = match cmd {
        PatchCommands::Accept { file, revision } => {
            vec![resolver.accept_patch(*file, *revision, actor)?]
        }
        PatchCommands::Reject { file, revision } => {
            vec![resolver.reject_patch(*file, *revision, actor)?]
        }
        PatchCommands::AcceptAll {
            workspace,
            revision,
        } => resolver.accept_all_patches(*workspace, *revision, actor)?,
        PatchCommands::RejectAll {
            workspace,
            revision,
        } => resolver.reject_all_patches(*workspace, *revision, actor)?,
    };

    if files.is_empty() {
        println!("Nothing pending at that revision.");
    } else {
        print_files(&files);
    }
    Ok(())
}
