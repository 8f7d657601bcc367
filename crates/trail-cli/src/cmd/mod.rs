pub mod artifact;
pub mod checklist;
pub mod commands;
pub mod config;
pub mod init;
pub mod next;
pub mod run;
pub mod session;

use anyhow::Context;
use std::io::Read;
use std::path::Path;

/// Artifact body from `--file`, or stdin when no file is given.
pub(crate) fn read_body(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read artifact body from stdin")?;
            Ok(body)
        }
    }
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
