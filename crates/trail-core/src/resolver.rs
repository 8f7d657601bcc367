use crate::error::Result;
use crate::index::SessionIndex;
use std::path::{Path, PathBuf};

/// Picks the session a command operates on.
pub struct SlugResolver {
    root: PathBuf,
}

impl SlugResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// An explicit slug is returned as-is; existence is checked on first store access.
    /// Otherwise the most recently created session wins.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(slug) = explicit {
            return Ok(slug.to_string());
        }
        let index = SessionIndex::load(&self.root)?;
        let last = index.last()?;
        tracing::debug!(slug = %last.slug, "resolved session from index");
        Ok(last.slug.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::TrailError;
    use crate::session::Session;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn empty_index_means_no_sessions() {
        let dir = TempDir::new().unwrap();
        let err = SlugResolver::new(dir.path()).resolve(None).unwrap_err();
        assert!(matches!(err, TrailError::NoSessionsExist));
        assert!(err.to_string().contains("trail session start"));
    }

    #[test]
    fn explicit_slug_is_not_checked() {
        let dir = TempDir::new().unwrap();
        let slug = SlugResolver::new(dir.path())
            .resolve(Some("not-created-yet"))
            .unwrap();
        assert_eq!(slug, "not-created-yet");
    }

    #[test]
    fn implicit_slug_is_most_recent_session() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::new("test");
        Session::create(dir.path(), &cfg, "zzz-first", "First", BTreeMap::new()).unwrap();
        Session::create(dir.path(), &cfg, "aaa-second", "Second", BTreeMap::new()).unwrap();
        let resolver = SlugResolver::new(dir.path());
        assert_eq!(resolver.resolve(None).unwrap(), "aaa-second");
        assert_eq!(resolver.resolve(Some("zzz-first")).unwrap(), "zzz-first");
    }
}
