use crate::output::print_json;
use anyhow::Context;
use trail_core::{config::Config, io, paths};
use std::path::Path;

/// Lock files are per-machine scratch; everything else under `.trail/` is committed.
const GITIGNORE_ENTRIES: &[&str] = &[".trail/index.lock", ".trail/sessions/*/.lock"];

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    for p in [paths::trail_dir(root), paths::sessions_dir(root)] {
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let created_config = !paths::config_path(root).exists();
    if created_config {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
    }

    for entry in GITIGNORE_ENTRIES {
        io::ensure_gitignore_entry(root, entry).context("failed to update .gitignore")?;
    }

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "project": project_name,
            "created_config": created_config,
        }))?;
        return Ok(());
    }

    println!("Initializing trail in: {}", root.display());
    if created_config {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    println!("\nNext: trail session start <slug> --title \"...\"");
    Ok(())
}
