use crate::cmd::{read_body, today};
use crate::output::print_json;
use anyhow::Context;
use std::path::{Path, PathBuf};
use trail_core::{artifact::ArtifactDraft, config::Config, context::CommandContext};

pub struct RunArgs {
    pub command: String,
    pub session: Option<String>,
    pub topic: Option<String>,
    pub file: Option<PathBuf>,
    pub supersedes: Option<String>,
}

/// Drive one workflow command through resolve, load, write, and check-off.
///
/// The artifact body is read only after inputs resolve, so a missing
/// prerequisite fails before stdin is consumed.
pub fn run(root: &Path, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let mut ctx = CommandContext::new(root, &config, &args.command)?;
    if let Some(old) = args.supersedes {
        ctx = ctx.supersedes(old);
    }

    ctx.resolve(args.session.as_deref())?;
    let fallback = ctx.load_inputs()?.missing();

    let body = read_body(args.file.as_deref()).context("failed to read artifact body")?;
    let mut draft = ArtifactDraft::new(body, today());
    draft.topic = args.topic;
    let written = ctx.persist(draft)?;

    if json {
        print_json(&serde_json::json!({
            "command": args.command,
            "artifact": written,
            "missing_inputs": fallback,
        }))?;
    } else {
        for name in &fallback {
            println!("note: no {name} in session; ran without it");
        }
        println!("Wrote: {}/{}", written.session, written.path);
        println!("Next: trail next --session {}", written.session);
    }
    Ok(())
}
