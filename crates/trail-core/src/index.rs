//! Top-level registry of sessions in creation order.
//!
//! `.trail/index.yaml` is the source of truth; `.trail/sessions/README.md` is
//! a Markdown projection regenerated on every mutation and never read back.
//! The last entry is, by construction, the most recently created session.

use crate::error::{Result, TrailError};
use crate::lock::FileLock;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIndexEntry {
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    sessions: Vec<SessionIndexEntry>,
}

#[derive(Debug)]
pub struct SessionIndex {
    root: PathBuf,
    entries: Vec<SessionIndexEntry>,
}

impl SessionIndex {
    /// Read the index. An absent file is an empty index.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::index_path(root);
        let file: IndexFile = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            IndexFile::default()
        };
        Ok(Self {
            root: root.to_path_buf(),
            entries: file.sessions,
        })
    }

    /// Run `f` against a freshly loaded index while holding the index lock.
    ///
    /// The index is persisted (and its projection re-rendered) only if `f`
    /// succeeds. The lock is released on every exit path.
    pub fn update<T>(root: &Path, f: impl FnOnce(&mut SessionIndex) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(&paths::index_lock_path(root))?;
        let mut index = Self::load(root)?;
        let before = index.entries.len();
        let out = f(&mut index)?;
        if index.entries.len() != before {
            index.save()?;
        }
        Ok(out)
    }

    /// Append `entry` at the end. Rejects a slug already in the index.
    ///
    /// Only meaningful inside [`SessionIndex::update`]; nothing is persisted here.
    pub fn append(&mut self, entry: SessionIndexEntry) -> Result<()> {
        if self.find(&entry.slug).is_some() {
            return Err(TrailError::SessionExists(entry.slug));
        }
        tracing::debug!(slug = %entry.slug, position = self.entries.len(), "index append");
        self.entries.push(entry);
        Ok(())
    }

    pub fn list_all(&self) -> &[SessionIndexEntry] {
        &self.entries
    }

    pub fn last(&self) -> Result<&SessionIndexEntry> {
        self.entries.last().ok_or(TrailError::NoSessionsExist)
    }

    pub fn find(&self, slug: &str) -> Option<&SessionIndexEntry> {
        self.entries.iter().find(|e| e.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        let file = IndexFile {
            sessions: self.entries.clone(),
        };
        let data = serde_yaml::to_string(&file)?;
        // index.yaml is the commit point, so the projection goes first.
        crate::io::atomic_write(
            &paths::index_readme_path(&self.root),
            self.render().as_bytes(),
        )?;
        crate::io::atomic_write(&paths::index_path(&self.root), data.as_bytes())
    }

    /// Markdown listing of every session, oldest first.
    pub fn render(&self) -> String {
        let mut out = String::from("# Sessions\n\n");
        if self.entries.is_empty() {
            out.push_str("_No sessions yet._\n");
            return out;
        }
        for e in &self.entries {
            out.push_str(&format!(
                "- {} [{}]({}/README.md) ({})\n",
                e.created_at.format("%Y-%m-%d"),
                e.title,
                e.slug,
                e.slug
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
