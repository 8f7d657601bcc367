use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::collections::BTreeMap;
use std::path::Path;
use trail_core::{config::Config, resolver::SlugResolver, session::Session};

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// Start a new session
    Start {
        slug: String,
        #[arg(long)]
        title: String,
        /// Free-form metadata, repeatable: --meta owner=ana
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
        meta: Vec<(String, String)>,
    },
    /// List sessions in creation order
    List,
    /// Show a session's checklist and recent activity
    Show {
        /// Session slug (default: most recently started session)
        slug: Option<String>,
    },
    /// Print the session commands default to
    Current,
}

pub fn run(root: &Path, subcmd: SessionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SessionSubcommand::Start { slug, title, meta } => start(root, &slug, &title, meta, json),
        SessionSubcommand::List => list(root, json),
        SessionSubcommand::Show { slug } => show(root, slug.as_deref(), json),
        SessionSubcommand::Current => current(root, json),
    }
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

fn start(
    root: &Path,
    slug: &str,
    title: &str,
    meta: Vec<(String, String)>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let metadata: BTreeMap<String, String> = meta.into_iter().collect();
    let session = Session::create(root, &config, slug, title, metadata)
        .with_context(|| format!("failed to start session '{slug}'"))?;

    if json {
        print_json(&session)?;
    } else {
        println!("Started session: {} ({})", session.slug, session.title);
        println!("Next: trail next");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    let sessions = Session::list(root).context("failed to list sessions")?;

    if json {
        print_json(&sessions)?;
        return Ok(());
    }
    if sessions.is_empty() {
        println!("No sessions. Run: trail session start <slug> --title \"...\"");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            let items = &s.checklist.items;
            let done = items.iter().filter(|i| i.done).count();
            vec![
                s.slug.clone(),
                s.created_at.format("%Y-%m-%d %H:%M").to_string(),
                format!("{done}/{}", items.len()),
                s.title.clone(),
            ]
        })
        .collect();
    print_table(&["SLUG", "CREATED", "DONE", "TITLE"], &rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show / current
// ---------------------------------------------------------------------------

fn show(root: &Path, slug: Option<&str>, json: bool) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    let slug = SlugResolver::new(root).resolve(slug)?;
    let session = Session::load(root, &slug)?;

    if json {
        print_json(&session)?;
        return Ok(());
    }

    println!("Session:  {}", session.slug);
    println!("Title:    {}", session.title);
    println!("Created:  {}", session.created_at.format("%Y-%m-%d %H:%M UTC"));
    for (k, v) in &session.metadata {
        println!("  {k}: {v}");
    }

    println!("\nChecklist:");
    for item in &session.checklist.items {
        let mark = if item.done { "x" } else { " " };
        match &item.path {
            Some(path) => println!("  [{mark}] {:<16} {path}", item.kind.to_string()),
            None => println!("  [{mark}] {}", item.kind),
        }
    }

    let recent: Vec<_> = session.checklist.activity.iter().rev().take(10).collect();
    if !recent.is_empty() {
        println!("\nRecent activity:");
        for entry in recent.into_iter().rev() {
            println!("  {}  {}", entry.date, entry.description);
        }
    }
    Ok(())
}

fn current(root: &Path, json: bool) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    let slug = SlugResolver::new(root).resolve(None)?;
    if json {
        print_json(&serde_json::json!({ "session": slug }))?;
    } else {
        println!("{slug}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_pairs() {
        assert_eq!(
            parse_meta("owner=ana").unwrap(),
            ("owner".to_string(), "ana".to_string())
        );
        assert_eq!(
            parse_meta("url=https://x?a=b").unwrap().1,
            "https://x?a=b".to_string()
        );
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=v").is_err());
    }
}
