use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use trail_core::{
    config::Config,
    next::{infer_next, NextAction},
    resolver::SlugResolver,
    session::Session,
};

pub fn run(root: &Path, session: Option<&str>, json: bool) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    let slug = SlugResolver::new(root).resolve(session)?;
    let session =
        Session::load(root, &slug).with_context(|| format!("failed to load session '{slug}'"))?;
    let next = infer_next(&session);

    if json {
        return print_json(&next);
    }

    println!("Session:  {}", next.session);
    println!("Message:  {}", next.message);
    match (&next.action, &next.command) {
        (NextAction::Run, Some(command)) => println!("Command:  trail run {command}"),
        (NextAction::Blocked, Some(command)) => println!("Blocked:  {command}"),
        _ => {}
    }
    Ok(())
}
