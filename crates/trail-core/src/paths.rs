use crate::error::{Result, TrailError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TRAIL_DIR: &str = ".trail";
pub const SESSIONS_DIR: &str = ".trail/sessions";

pub const CONFIG_FILE: &str = ".trail/config.yaml";
pub const INDEX_FILE: &str = ".trail/index.yaml";
pub const INDEX_LOCK_FILE: &str = ".trail/index.lock";
pub const INDEX_README: &str = ".trail/sessions/README.md";

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const README_FILE: &str = "README.md";
pub const SESSION_LOCK_FILE: &str = ".lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn trail_dir(root: &Path) -> PathBuf {
    root.join(TRAIL_DIR)
}

pub fn sessions_dir(root: &Path) -> PathBuf {
    root.join(SESSIONS_DIR)
}

pub fn session_dir(root: &Path, slug: &str) -> PathBuf {
    sessions_dir(root).join(slug)
}

pub fn session_manifest(root: &Path, slug: &str) -> PathBuf {
    session_dir(root, slug).join(MANIFEST_FILE)
}

pub fn session_readme(root: &Path, slug: &str) -> PathBuf {
    session_dir(root, slug).join(README_FILE)
}

pub fn session_lock(root: &Path, slug: &str) -> PathBuf {
    session_dir(root, slug).join(SESSION_LOCK_FILE)
}

/// Absolute path of an artifact given its session-relative path.
pub fn artifact_path(root: &Path, slug: &str, relative: &str) -> PathBuf {
    session_dir(root, slug).join(relative)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn index_path(root: &Path) -> PathBuf {
    root.join(INDEX_FILE)
}

pub fn index_lock_path(root: &Path) -> PathBuf {
    root.join(INDEX_LOCK_FILE)
}

pub fn index_readme_path(root: &Path) -> PathBuf {
    root.join(INDEX_README)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(TrailError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Reduce free text ("Split CSV parser!") to a kebab-case slug ("split-csv-parser").
///
/// Returns `None` when nothing alphanumeric survives.
pub fn slugify(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let mut slug = out.trim_end_matches('-').to_string();
    if slug.len() > 48 {
        slug.truncate(48);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
