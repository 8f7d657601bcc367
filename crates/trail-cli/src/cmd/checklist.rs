use crate::cmd::today;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use trail_core::{
    checklist::ChecklistSynchronizer, config::Config, resolver::SlugResolver, types::ArtifactKind,
};

#[derive(Subcommand)]
pub enum ChecklistSubcommand {
    /// Mark a checklist item complete (no-op if already complete)
    Mark {
        kind: String,
        #[arg(long)]
        session: Option<String>,
        /// Artifact path to link from the item
        #[arg(long)]
        path: Option<String>,
    },
    /// Append an entry to the activity log
    Log {
        description: String,
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: ChecklistSubcommand, json: bool) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    let checklist = ChecklistSynchronizer::new(root);

    match subcmd {
        ChecklistSubcommand::Mark {
            kind,
            session,
            path,
        } => {
            let kind: ArtifactKind = kind.parse()?;
            let slug = SlugResolver::new(root).resolve(session.as_deref())?;
            checklist.mark_complete(&slug, &kind, path.as_deref())?;
            if json {
                print_json(&serde_json::json!({ "session": slug, "kind": kind, "done": true }))?;
            } else {
                println!("Checked: {slug}/{kind}");
            }
        }
        ChecklistSubcommand::Log {
            description,
            session,
        } => {
            let slug = SlugResolver::new(root).resolve(session.as_deref())?;
            let date = today();
            checklist.append_activity(&slug, date, &description)?;
            if json {
                print_json(&serde_json::json!({
                    "session": slug,
                    "date": date,
                    "description": description,
                }))?;
            } else {
                println!("Logged: {date} {description}");
            }
        }
    }
    Ok(())
}
