//! Per-session checklist and activity log.
//!
//! The state lives inside the session manifest; [`ChecklistSynchronizer`] is
//! the only writer. Every mutation is a locked read-modify-write of the
//! manifest followed by a README re-render.

use crate::error::Result;
use crate::lock::FileLock;
use crate::paths;
use crate::session::Session;
use crate::types::ArtifactKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ChecklistState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub kind: ArtifactKind,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistState {
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

impl ChecklistState {
    pub fn seeded(kinds: &[ArtifactKind]) -> Self {
        let mut state = Self::default();
        for kind in kinds {
            if state.item(kind).is_none() {
                state.items.push(ChecklistItem {
                    kind: kind.clone(),
                    done: false,
                    path: None,
                    completed_at: None,
                });
            }
        }
        state
    }

    pub fn item(&self, kind: &ArtifactKind) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| &i.kind == kind)
    }

    pub fn is_complete(&self, kind: &ArtifactKind) -> bool {
        self.item(kind).map(|i| i.done).unwrap_or(false)
    }

    /// True when any completed item's kind starts with `prefix`.
    pub fn any_complete_with_prefix(&self, prefix: &str) -> bool {
        self.items
            .iter()
            .any(|i| i.done && i.kind.matches_prefix(prefix))
    }

    /// Check `kind` off. Returns false (and changes nothing) if it already was.
    ///
    /// Kinds that were not seeded are added as completed items.
    pub fn mark_complete(&mut self, kind: &ArtifactKind, path: Option<&str>) -> bool {
        let now = Utc::now();
        match self.items.iter_mut().find(|i| &i.kind == kind) {
            Some(item) if item.done => false,
            Some(item) => {
                item.done = true;
                item.path = path.map(str::to_string);
                item.completed_at = Some(now);
                true
            }
            None => {
                self.items.push(ChecklistItem {
                    kind: kind.clone(),
                    done: true,
                    path: path.map(str::to_string),
                    completed_at: Some(now),
                });
                true
            }
        }
    }

    pub fn append_activity(&mut self, date: NaiveDate, description: impl Into<String>) {
        self.activity.push(ActivityEntry {
            date,
            description: description.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// ChecklistSynchronizer
// ---------------------------------------------------------------------------

pub struct ChecklistSynchronizer {
    root: PathBuf,
}

impl ChecklistSynchronizer {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Idempotent: an already-complete item is left as is and nothing is written.
    pub fn mark_complete(&self, slug: &str, kind: &ArtifactKind, path: Option<&str>) -> Result<()> {
        self.modify(slug, |checklist| {
            let changed = checklist.mark_complete(kind, path);
            if changed {
                tracing::debug!(%slug, %kind, "checklist item completed");
            }
            changed
        })
    }

    /// Always appends, even when an identical entry exists.
    pub fn append_activity(&self, slug: &str, date: NaiveDate, description: &str) -> Result<()> {
        self.modify(slug, |checklist| {
            checklist.append_activity(date, description);
            true
        })
    }

    pub fn state(&self, slug: &str) -> Result<ChecklistState> {
        Ok(Session::load(&self.root, slug)?.checklist)
    }

    fn modify(&self, slug: &str, f: impl FnOnce(&mut ChecklistState) -> bool) -> Result<()> {
        // Load first so a missing session surfaces as SessionNotFound
        // instead of a lock file being created in a fresh directory.
        Session::load(&self.root, slug)?;
        let _lock = FileLock::acquire(&paths::session_lock(&self.root, slug))?;
        let mut session = Session::load(&self.root, slug)?;
        if f(&mut session.checklist) {
            session.save(&self.root)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
