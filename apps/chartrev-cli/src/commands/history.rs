// history.rs — History subcommands: show, verify.

use chartrev_engine::Engine;
use chartrev_history::{ContentLog, HistoryError};
use chartrev_store::JsonFileBackend;
use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show a file's content history, oldest first.
    Show {
        /// Workspace ID.
        workspace: Uuid,
        /// File ID (removed files included).
        file: Uuid,
    },
    /// Verify a workspace's history hash chain.
    Verify {
        /// Workspace ID.
        workspace: Uuid,
    },
}

pub fn execute(cmd: &HistoryCommands, engine: &Engine) -> anyhow::Result<()> {
    match cmd {
        HistoryCommands::Show { workspace, file } => {
            let entries = engine.store().file_history(*workspace, *file)?;
            if entries.is_empty() {
                println!("No history for file {}.", file);
                return Ok(());
            }
            println!("{:<5} {:<12} {:<20} {:<10} PATH", "REV", "CAUSE", "RECORDED", "HASH");
            println!("{}", "-".repeat(80));
            for entry in &entries {
                let hash = entry
                    .content_hash
                    .as_deref()
                    .map(|h| h[..h.len().min(8)].to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<5} {:<12} {:<20} {:<10} {}",
                    entry.revision_number,
                    entry.cause.to_string(),
                    entry.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    hash,
                    entry.file_path
                );
            }
        }

        HistoryCommands::Verify { workspace } => {
            let backend = JsonFileBackend::new(engine.config().store_dir())?;
            let path = backend.history_path(*workspace);
            if !path.exists() {
                println!("No history found at {}", path.display());
                return Ok(());
            }

            match ContentLog::verify_chain(&path) {
                Ok(_) => {
                    let entries = ContentLog::read_all(&path)?;
                    let bad = entries.iter().filter(|e| !e.verify_content_hash()).count();
                    if bad > 0 {
                        anyhow::bail!("{} entr(ies) have content that does not match their hash", bad);
                    }
                    println!(
                        "History verified: {} entr(ies), hash chain intact.",
                        entries.len()
                    );
                }
                Err(HistoryError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    anyhow::bail!("history integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
