// plan.rs — Plan subcommands: create, attach, list, show.

use std::path::PathBuf;

use chartrev_engine::{Actor, Engine};
use chartrev_plan::Plan;
use clap::Subcommand;
use uuid::Uuid;

use super::read_content;

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Record a new plan for a workspace.
    Create {
        /// Workspace ID.
        workspace: Uuid,
        /// The prompt the plan answers.
        prompt: String,
        /// Earlier plan this one supersedes.
        #[arg(long)]
        supersedes: Option<Uuid>,
    },
    /// Attach a proposed patch to a plan.
    Attach {
        /// Plan ID.
        plan: Uuid,
        /// File the patch replaces.
        file: Uuid,
        /// Proposed content.
        #[arg(long)]
        content: Option<String>,
        /// Read proposed content from a local file.
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// List plans for a workspace (newest first).
    List {
        /// Workspace ID.
        workspace: Uuid,
    },
    /// Show a plan and its patches.
    Show {
        /// Plan ID.
        id: Uuid,
    },
}

pub fn execute(cmd: &PlanCommands, engine: &Engine, actor: &Actor) -> anyhow::Result<()> {
    match cmd {
        PlanCommands::Create {
            workspace,
            prompt,
            supersedes,
        } => {
            let plan = engine.create_plan(actor, prompt, *workspace, *supersedes)?;
            println!("Created plan {}", plan.plan_id);
            if let Some(prior) = plan.supersedes {
                println!("Supersedes {}", prior);
            }
        }

        PlanCommands::Attach {
            plan,
            file,
            content,
            from_file,
        } => {
            let content = read_content(content.as_deref(), from_file.as_ref())?;
            let plan = engine.attach_patch(*plan, *file, &content)?;
            println!(
                "Attached patch for {} to plan {} ({} patch(es))",
                file,
                plan.plan_id,
                plan.patches.len()
            );
        }

        PlanCommands::List { workspace } => {
            let plans = engine.plans().list_plans(*workspace)?;
            if plans.is_empty() {
                println!("No plans.");
                return Ok(());
            }
            println!("{:<38} {:<30} {:<7} PROMPT", "PLAN ID", "STATUS", "PATCHES");
            println!("{}", "-".repeat(100));
            for plan in &plans {
                println!(
                    "{:<38} {:<30} {:<7} {}",
                    plan.plan_id,
                    truncate(&plan.status.to_string(), 30),
                    plan.patches.len(),
                    truncate(&plan.prompt, 40)
                );
            }
        }

        PlanCommands::Show { id } => {
            let plan = engine.plans().get_plan(*id)?;
            print_plan(&plan);
        }
    }

    Ok(())
}

fn print_plan(plan: &Plan) {
    println!("Plan:       {}", plan.plan_id);
    println!("Workspace:  {}", plan.workspace_id);
    println!("Status:     {}", plan.status);
    println!("Created:    {} by {}", plan.created_at, plan.created_by);
    if let Some(prior) = plan.supersedes {
        println!("Supersedes: {}", prior);
    }
    if let Some(next) = plan.superseded_by {
        println!("Superseded by: {}", next);
    }
    println!("Prompt:     {}", plan.prompt);
    println!();
    if plan.patches.is_empty() {
        println!("No patches.");
        return;
    }
    println!("Patches:");
    for patch in &plan.patches {
        println!("  {} ({} bytes)", patch.file_id, patch.content.len());
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
