use crate::cmd::{read_body, today};
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use trail_core::{
    artifact::ArtifactDraft,
    checklist::ChecklistSynchronizer,
    config::Config,
    frontmatter,
    resolver::SlugResolver,
    store::ArtifactStore,
    types::{ArtifactKind, WriteMode},
};

#[derive(Subcommand)]
pub enum ArtifactSubcommand {
    /// Write an artifact directly, bypassing the command table
    Write {
        /// Artifact kind, e.g. plan, decision, review-security
        kind: String,
        #[arg(long)]
        session: Option<String>,
        /// Topic, used in the filename of dated artifacts
        #[arg(long)]
        topic: Option<String>,
        /// Read the body from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// overwrite | append (singular kinds), create-new (dated kinds)
        #[arg(long)]
        mode: Option<WriteMode>,
    },
    /// Print an artifact
    Show {
        /// Artifact kind; with --latest, a kind prefix such as `review`
        kind: String,
        #[arg(long)]
        session: Option<String>,
        /// Most recent artifact whose kind starts with KIND
        #[arg(long)]
        latest: bool,
    },
    /// List a session's artifacts, oldest first
    List {
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: ArtifactSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        ArtifactSubcommand::Write {
            kind,
            session,
            topic,
            file,
            mode,
        } => write(
            root,
            &config,
            &kind,
            session.as_deref(),
            topic,
            file.as_deref(),
            mode,
            json,
        ),
        ArtifactSubcommand::Show {
            kind,
            session,
            latest,
        } => show(root, &kind, session.as_deref(), latest, json),
        ArtifactSubcommand::List { session } => list(root, session.as_deref(), json),
    }
}

// ---------------------------------------------------------------------------
// write
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn write(
    root: &Path,
    config: &Config,
    kind_str: &str,
    session: Option<&str>,
    topic: Option<String>,
    file: Option<&Path>,
    mode: Option<WriteMode>,
    json: bool,
) -> anyhow::Result<()> {
    let kind: ArtifactKind = kind_str.parse()?;
    let slug = SlugResolver::new(root).resolve(session)?;
    let body = read_body(file)?;

    let mut draft = ArtifactDraft::new(body, today());
    draft.topic = topic;
    let mode = mode.unwrap_or_else(|| config.write_mode_for(&kind));

    let store = ArtifactStore::new(root);
    let written = store
        .write(&slug, &kind, draft, mode)
        .with_context(|| format!("failed to write {kind} to session '{slug}'"))?;

    let checklist = ChecklistSynchronizer::new(root);
    checklist.mark_complete(&slug, &kind, Some(&written.path))?;
    checklist.append_activity(
        &slug,
        today(),
        &format!("artifact write: {}", written.path),
    )?;

    if json {
        print_json(&written)?;
    } else {
        println!("Wrote: {}/{}", written.session, written.path);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(
    root: &Path,
    kind_str: &str,
    session: Option<&str>,
    latest: bool,
    json: bool,
) -> anyhow::Result<()> {
    let slug = SlugResolver::new(root).resolve(session)?;
    let store = ArtifactStore::new(root);
    let artifact = if latest {
        store.read_latest(&slug, kind_str)?
    } else {
        store.read(&slug, &kind_str.parse()?)?
    };

    if json {
        print_json(&artifact)?;
    } else {
        print!(
            "{}",
            frontmatter::serialize(&artifact.front_matter, &artifact.body)?
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, session: Option<&str>, json: bool) -> anyhow::Result<()> {
    let slug = SlugResolver::new(root).resolve(session)?;
    let artifacts = ArtifactStore::new(root).list(&slug)?;

    if json {
        let refs: Vec<_> = artifacts.iter().map(|a| a.to_ref()).collect();
        print_json(&refs)?;
        return Ok(());
    }
    if artifacts.is_empty() {
        println!("No artifacts in session '{slug}'. Run: trail next");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = artifacts
        .iter()
        .map(|a| {
            vec![
                a.date().map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                a.kind.to_string(),
                a.path.clone(),
            ]
        })
        .collect();
    print_table(&["DATE", "KIND", "PATH"], &rows);
    Ok(())
}
