//! On-disk artifact layout for sessions.
//!
//! Singular kinds live at a fixed path (`spec/spec.md`); plural kinds get a
//! dated file per write (`reviews/2026-03-14-security.md`, then
//! `reviews/2026-03-14-security-2.md` for a second write that day). Every file is
//! front matter plus Markdown, so it can be re-read without the command that
//! produced it.

use crate::artifact::{
    Artifact, ArtifactDraft, ArtifactRef, KEY_DATE, KEY_KIND, KEY_SESSION, KEY_TOPIC,
};
use crate::error::{Result, TrailError};
use crate::frontmatter;
use crate::paths;
use crate::session::Session;
use crate::types::{ArtifactKind, WriteMode};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Session-relative directories that hold artifacts.
const ARTIFACT_DIRS: &[&str] = &[
    "spec",
    "triage",
    "plan",
    "ship",
    "reviews",
    "decisions",
    "handoffs",
    "rca",
];

/// Upper bound on same-day instances sharing one derived path.
const MAX_INSTANCES: u32 = 999;

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_session(&self, slug: &str) -> Result<()> {
        if Session::exists(&self.root, slug) {
            Ok(())
        } else {
            Err(TrailError::SessionNotFound(slug.to_string()))
        }
    }

    // ---------------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------------

    pub fn exists(&self, slug: &str, kind: &ArtifactKind) -> Result<bool> {
        self.ensure_session(slug)?;
        match kind.singular_path() {
            Some(rel) => Ok(paths::artifact_path(&self.root, slug, rel).is_file()),
            None => Ok(self
                .collect(slug, &[kind.dir()])?
                .iter()
                .any(|(a, _)| &a.kind == kind)),
        }
    }

    /// Read the live instance of a singular kind, or the latest instance of a plural one.
    pub fn read(&self, slug: &str, kind: &ArtifactKind) -> Result<Artifact> {
        self.ensure_session(slug)?;
        let Some(rel) = kind.singular_path() else {
            return self
                .latest_where(slug, &[kind.dir()], |k| k == kind)?
                .ok_or_else(|| not_found(slug, &kind.to_string()));
        };
        let path = paths::artifact_path(&self.root, slug, rel);
        if !path.is_file() {
            return Err(not_found(slug, &kind.to_string()));
        }
        self.load(slug, &path, rel)?
            .ok_or_else(|| not_found(slug, &kind.to_string()))
    }

    /// Most recent artifact whose kind name starts with `prefix`.
    ///
    /// Ordered by embedded date, then file modification time, then path.
    pub fn read_latest(&self, slug: &str, prefix: &str) -> Result<Artifact> {
        self.ensure_session(slug)?;
        let dirs = dirs_for_prefix(prefix);
        self.latest_where(slug, &dirs, |k| k.matches_prefix(prefix))?
            .ok_or_else(|| not_found(slug, &format!("{prefix}*")))
    }

    /// Every artifact in the session, oldest first.
    pub fn list(&self, slug: &str) -> Result<Vec<Artifact>> {
        self.ensure_session(slug)?;
        Ok(self
            .collect(slug, ARTIFACT_DIRS)?
            .into_iter()
            .map(|(a, _)| a)
            .collect())
    }

    // ---------------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------------

    /// Persist `draft` as a `kind` artifact. Durable on return.
    ///
    /// The store stamps `kind`, `session`, `date`, and `topic` into the header.
    pub fn write(
        &self,
        slug: &str,
        kind: &ArtifactKind,
        draft: ArtifactDraft,
        mode: WriteMode,
    ) -> Result<ArtifactRef> {
        self.ensure_session(slug)?;
        let lifecycle = kind.lifecycle();
        if !mode.applies_to(lifecycle) {
            return Err(TrailError::LifecycleMismatch {
                kind: kind.to_string(),
                lifecycle: lifecycle.to_string(),
                mode: mode.to_string(),
            });
        }

        let topic = draft.topic.as_deref().and_then(paths::slugify);
        let mut rel = derive_path(kind, draft.date, topic.as_deref());
        let path = paths::artifact_path(&self.root, slug, &rel);

        let mut fm = draft.front_matter;
        fm.insert(KEY_KIND, kind.to_string());
        fm.insert(KEY_SESSION, slug);
        if fm.get_str(KEY_DATE).is_none() {
            fm.insert(KEY_DATE, draft.date.format("%Y-%m-%d").to_string());
        }
        if let Some(t) = &topic {
            fm.insert(KEY_TOPIC, t.as_str());
        }

        match mode {
            WriteMode::Overwrite => {
                let raw = frontmatter::serialize(&fm, &draft.body)?;
                crate::io::atomic_write(&path, raw.as_bytes())?;
            }
            WriteMode::Append => {
                let (fm, body) = if path.is_file() {
                    let existing = std::fs::read_to_string(&path)?;
                    let (mut merged, mut body) = frontmatter::parse(&existing, &rel)?;
                    merged.merge(fm);
                    if !body.is_empty() && !body.ends_with('\n') {
                        body.push('\n');
                    }
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(&draft.body);
                    (merged, body)
                } else {
                    (fm, draft.body)
                };
                let raw = frontmatter::serialize(&fm, &body)?;
                crate::io::atomic_write(&path, raw.as_bytes())?;
            }
            WriteMode::CreateNew => {
                let raw = frontmatter::serialize(&fm, &draft.body)?;
                let mut candidates: Vec<String> = std::iter::once(rel.clone())
                    .chain((2..=MAX_INSTANCES).map(|n| numbered(&rel, n)))
                    .collect();
                let abs: Vec<PathBuf> = candidates
                    .iter()
                    .map(|r| paths::artifact_path(&self.root, slug, r))
                    .collect();
                match crate::io::atomic_write_first_free(&abs, raw.as_bytes())? {
                    Some(i) => rel = candidates.swap_remove(i),
                    None => return Err(TrailError::DuplicateArtifact(rel)),
                }
            }
        }

        tracing::info!(session = %slug, %kind, path = %rel, %mode, "artifact written");
        Ok(ArtifactRef {
            session: slug.to_string(),
            kind: kind.clone(),
            path: rel,
        })
    }

    // ---------------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------------

    fn latest_where(
        &self,
        slug: &str,
        dirs: &[&str],
        pred: impl Fn(&ArtifactKind) -> bool,
    ) -> Result<Option<Artifact>> {
        Ok(self
            .collect(slug, dirs)?
            .into_iter()
            .filter(|(a, _)| pred(&a.kind))
            .map(|(a, _)| a)
            .last())
    }

    /// Parse every artifact under `dirs`, sorted by (date, mtime, path).
    fn collect(&self, slug: &str, dirs: &[&str]) -> Result<Vec<(Artifact, SystemTime)>> {
        let mut found = Vec::new();
        for dir in dirs {
            let abs = paths::artifact_path(&self.root, slug, dir);
            if !abs.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&abs)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.ends_with(".md") || !entry.file_type()?.is_file() {
                    continue;
                }
                let rel = format!("{dir}/{name}");
                let mtime = entry.metadata()?.modified()?;
                if let Some(artifact) = self.load(slug, &entry.path(), &rel)? {
                    found.push((artifact, mtime));
                }
            }
        }
        found.sort_by(|(a, at), (b, bt)| {
            a.date()
                .cmp(&b.date())
                .then(at.cmp(bt))
                .then_with(|| instance_number(&a.path).cmp(&instance_number(&b.path)))
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(found)
    }

    /// Parse one file. `None` for Markdown the tracker cannot attribute to a kind.
    fn load(&self, slug: &str, abs: &Path, rel: &str) -> Result<Option<Artifact>> {
        let raw = std::fs::read_to_string(abs)?;
        let (front_matter, body) = frontmatter::parse(&raw, rel)?;
        let kind = match front_matter.get_str(KEY_KIND) {
            Some(k) => Some(k.parse::<ArtifactKind>().map_err(|_| {
                TrailError::MalformedArtifact {
                    path: rel.to_string(),
                    reason: format!("unknown kind '{k}'"),
                }
            })?),
            None => ArtifactKind::fixed()
                .iter()
                .find(|k| k.singular_path() == Some(rel))
                .cloned(),
        };
        let Some(kind) = kind else {
            tracing::warn!(session = %slug, path = %rel, "skipping file without a kind");
            return Ok(None);
        };
        Ok(Some(Artifact {
            session: slug.to_string(),
            kind,
            path: rel.to_string(),
            front_matter,
            body,
        }))
    }
}

fn not_found(slug: &str, kind: &str) -> TrailError {
    TrailError::ArtifactNotFound {
        session: slug.to_string(),
        kind: kind.to_string(),
    }
}

/// Session-relative path for a write of `kind` on `date`.
pub fn derive_path(kind: &ArtifactKind, date: chrono::NaiveDate, topic: Option<&str>) -> String {
    if let Some(rel) = kind.singular_path() {
        return rel.to_string();
    }
    let stem = match (kind, topic) {
        (ArtifactKind::Review(sub), Some(t)) => format!("{sub}-{t}"),
        (ArtifactKind::Review(sub), None) => sub.clone(),
        (_, Some(t)) => t.to_string(),
        (k, None) => k.to_string(),
    };
    format!("{}/{}-{stem}.md", kind.dir(), date.format("%Y-%m-%d"))
}

/// `reviews/2026-03-01-security.md` becomes `reviews/2026-03-01-security-2.md` for `n = 2`.
fn numbered(rel: &str, n: u32) -> String {
    let stem = rel.strip_suffix(".md").unwrap_or(rel);
    format!("{stem}-{n}.md")
}

/// Position of a plural instance among same-stem writes; 1 for the unsuffixed path.
fn instance_number(rel: &str) -> u32 {
    rel.strip_suffix(".md")
        .and_then(|stem| stem.rsplit_once('-'))
        .and_then(|(_, n)| n.parse::<u32>().ok())
        .filter(|n| (2..=MAX_INSTANCES).contains(n))
        .unwrap_or(1)
}

/// Directories that can hold a kind whose name starts with `prefix`.
fn dirs_for_prefix(prefix: &str) -> Vec<&'static str> {
    let mut dirs: Vec<&'static str> = Vec::new();
    let mut push = |d: &'static str| {
        if !dirs.contains(&d) {
            dirs.push(d);
        }
    };
    for kind in ArtifactKind::fixed() {
        if kind.matches_prefix(prefix) {
            push(kind.dir());
        }
    }
    if "review-".starts_with(prefix) || prefix.starts_with("review-") {
        push("reviews");
    }
    dirs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
