use crate::checklist::ChecklistState;
use crate::config::Config;
use crate::error::{Result, TrailError};
use crate::index::{SessionIndex, SessionIndexEntry};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Schema-less at this layer; interpreted by individual commands.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub checklist: ChecklistState,
}

impl Session {
    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// Create a session and register it in the index.
    ///
    /// Runs under the index lock, so `created_at` order always matches index order.
    pub fn create(
        root: &Path,
        cfg: &Config,
        slug: impl Into<String>,
        title: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self> {
        let slug = slug.into();
        let title = title.into();
        paths::validate_slug(&slug)?;

        // Set once this call owns the session directory, so a failed index
        // save can remove it again.
        let mut claimed_dir = false;
        let created = SessionIndex::update(root, |index| {
            if index.find(&slug).is_some() || Self::exists(root, &slug) {
                return Err(TrailError::SessionExists(slug.clone()));
            }

            let now = Utc::now();
            let mut checklist = ChecklistState::seeded(&cfg.checklist);
            checklist.append_activity(now.date_naive(), format!("Session started: {title}"));

            let session = Session {
                slug: slug.clone(),
                title: title.clone(),
                created_at: now,
                metadata,
                checklist,
            };
            claimed_dir = !paths::session_dir(root, &slug).exists();
            session.save(root)?;
            index.append(SessionIndexEntry {
                slug: slug.clone(),
                created_at: now,
                title: title.clone(),
            })?;
            Ok(session)
        });

        match created {
            Ok(session) => {
                tracing::info!(%slug, "session created");
                Ok(session)
            }
            Err(e) => {
                if claimed_dir {
                    let dir = paths::session_dir(root, &slug);
                    if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                        tracing::warn!(%slug, error = %cleanup, "could not remove partial session");
                    }
                }
                Err(e)
            }
        }
    }

    pub fn exists(root: &Path, slug: &str) -> bool {
        paths::session_manifest(root, slug).exists()
    }

    pub fn load(root: &Path, slug: &str) -> Result<Self> {
        let manifest = paths::session_manifest(root, slug);
        if !manifest.exists() {
            return Err(TrailError::SessionNotFound(slug.to_string()));
        }
        let data = std::fs::read_to_string(&manifest)?;
        let session: Session = serde_yaml::from_str(&data)?;
        Ok(session)
    }

    /// Persist the manifest, then re-render the README projection.
    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::session_manifest(root, &self.slug), data.as_bytes())?;
        crate::io::atomic_write(
            &paths::session_readme(root, &self.slug),
            self.render_readme().as_bytes(),
        )
    }

    /// Sessions in index (creation) order. Index entries whose manifest is gone are skipped.
    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let index = SessionIndex::load(root)?;
        let mut sessions = Vec::with_capacity(index.len());
        for entry in index.list_all() {
            match Self::load(root, &entry.slug) {
                Ok(s) => sessions.push(s),
                Err(TrailError::SessionNotFound(_)) => {
                    tracing::warn!(slug = %entry.slug, "indexed session has no manifest");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(sessions)
    }

    // ---------------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------------

    pub fn render_readme(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);
        out.push_str(&format!("- **Slug:** `{}`\n", self.slug));
        out.push_str(&format!(
            "- **Created:** {}\n",
            self.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        for (key, value) in &self.metadata {
            out.push_str(&format!("- **{key}:** {value}\n"));
        }

        out.push_str("\n## Checklist\n\n");
        if self.checklist.items.is_empty() {
            out.push_str("_Nothing tracked yet._\n");
        }
        for item in &self.checklist.items {
            let mark = if item.done { "x" } else { " " };
            match &item.path {
                Some(p) => out.push_str(&format!("- [{mark}] {}: [{p}]({p})\n", item.kind)),
                None => out.push_str(&format!("- [{mark}] {}\n", item.kind)),
            }
        }

        out.push_str("\n## Activity\n\n");
        for entry in &self.checklist.activity {
            out.push_str(&format!("- {}: {}\n", entry.date, entry.description));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;
    use tempfile::TempDir;

    fn cfg() -> Config {
        Config::new("test")
    }

    #[test]
    fn session_create_load() {
        let dir = TempDir::new().unwrap();
        let mut meta = BTreeMap::new();
        meta.insert("target".to_string(), "staging".to_string());

        let session =
            Session::create(dir.path(), &cfg(), "csv-import", "CSV import", meta).unwrap();
        assert_eq!(session.slug, "csv-import");
        assert!(!session.checklist.is_complete(&ArtifactKind::Spec));
        assert_eq!(session.checklist.activity.len(), 1);

        let loaded = Session::load(dir.path(), "csv-import").unwrap();
        assert_eq!(loaded.title, "CSV import");
        assert_eq!(loaded.metadata.get("target").map(String::as_str), Some("staging"));
        assert_eq!(loaded.created_at, session.created_at);

        let index = SessionIndex::load(dir.path()).unwrap();
        assert_eq!(index.last().unwrap().slug, "csv-import");
    }

    #[test]
    fn session_create_duplicate_fails() {
        let dir = TempDir::new().unwrap();
        Session::create(dir.path(), &cfg(), "auth", "Auth", BTreeMap::new()).unwrap();
        let err = Session::create(dir.path(), &cfg(), "auth", "Again", BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, TrailError::SessionExists(_)));
        assert_eq!(SessionIndex::load(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn failed_index_save_leaves_no_session_behind() {
        let dir = TempDir::new().unwrap();
        // A directory where the sessions README belongs makes the index save fail.
        let blocker = paths::index_readme_path(dir.path());
        std::fs::create_dir_all(blocker.join("keep")).unwrap();

        assert!(Session::create(dir.path(), &cfg(), "auth", "Auth", BTreeMap::new()).is_err());
        assert!(!paths::session_dir(dir.path(), "auth").exists());
        assert!(SessionIndex::load(dir.path()).unwrap().is_empty());

        std::fs::remove_dir_all(&blocker).unwrap();
        Session::create(dir.path(), &cfg(), "auth", "Auth", BTreeMap::new()).unwrap();
        assert_eq!(SessionIndex::load(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn session_create_invalid_slug() {
        let dir = TempDir::new().unwrap();
        let err = Session::create(dir.path(), &cfg(), "Bad Slug", "x", BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, TrailError::InvalidSlug(_)));
        assert!(SessionIndex::load(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn load_missing_session() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Session::load(dir.path(), "nope"),
            Err(TrailError::SessionNotFound(_))
        ));
    }

    #[test]
    fn list_follows_creation_order() {
        let dir = TempDir::new().unwrap();
        for slug in ["b-second", "a-first", "c-third"] {
            Session::create(dir.path(), &cfg(), slug, slug, BTreeMap::new()).unwrap();
        }
        let slugs: Vec<_> = Session::list(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.slug)
            .collect();
        assert_eq!(slugs, ["b-second", "a-first", "c-third"]);
    }

    #[test]
    fn readme_renders_checklist_and_metadata() {
        let dir = TempDir::new().unwrap();
        let mut meta = BTreeMap::new();
        meta.insert("risk".to_string(), "low".to_string());
        Session::create(dir.path(), &cfg(), "csv-import", "CSV import", meta).unwrap();

        let readme = std::fs::read_to_string(paths::session_readme(dir.path(), "csv-import"))
            .unwrap();
        assert!(readme.starts_with("# CSV import\n"));
        assert!(readme.contains("- **risk:** low"));
        assert!(readme.contains("- [ ] spec"));
        assert!(readme.contains("Session started: CSV import"));
    }
}
