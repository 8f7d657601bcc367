use crate::frontmatter::FrontMatter;
use crate::types::ArtifactKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Front matter keys the store maintains on every artifact it writes.
pub const KEY_COMMAND: &str = "command";
pub const KEY_KIND: &str = "kind";
pub const KEY_SESSION: &str = "session";
pub const KEY_DATE: &str = "date";
pub const KEY_TOPIC: &str = "topic";

/// Name under `related` pointing at the artifact a new one replaces.
pub const RELATED_SUPERSEDES: &str = "supersedes";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub session: String,
    pub kind: ArtifactKind,
    /// Relative to the session directory.
    pub path: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Artifact {
    /// Date from the `date` header, falling back to a `YYYY-MM-DD` filename prefix.
    pub fn date(&self) -> Option<NaiveDate> {
        self.front_matter
            .get_str(KEY_DATE)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .or_else(|| date_from_filename(&self.path))
    }

    pub fn command(&self) -> Option<&str> {
        self.front_matter.get_str(KEY_COMMAND)
    }

    pub fn to_ref(&self) -> ArtifactRef {
        ArtifactRef {
            session: self.session.clone(),
            kind: self.kind.clone(),
            path: self.path.clone(),
        }
    }
}

/// Pointer to a stored artifact, as returned by writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub session: String,
    pub kind: ArtifactKind,
    pub path: String,
}

/// Content a command hands to the store.
#[derive(Debug, Clone)]
pub struct ArtifactDraft {
    pub front_matter: FrontMatter,
    pub body: String,
    /// Free text; slugified into the filename of plural kinds.
    pub topic: Option<String>,
    pub date: NaiveDate,
}

impl ArtifactDraft {
    pub fn new(body: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            front_matter: FrontMatter::new(),
            body: body.into(),
            topic: None,
            date,
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn front_matter(mut self, fm: FrontMatter) -> Self {
        self.front_matter = fm;
        self
    }
}

pub(crate) fn date_from_filename(path: &str) -> Option<NaiveDate> {
    let name = path.rsplit('/').next()?;
    let prefix = name.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(path: &str, fm: FrontMatter) -> Artifact {
        Artifact {
            session: "s".to_string(),
            kind: ArtifactKind::Decision,
            path: path.to_string(),
            front_matter: fm,
            body: String::new(),
        }
    }

    #[test]
    fn date_prefers_header() {
        let a = artifact(
            "decisions/2026-01-01-db.md",
            FrontMatter::new().with(KEY_DATE, "2026-02-02"),
        );
        assert_eq!(a.date(), NaiveDate::from_ymd_opt(2026, 2, 2));
    }

    #[test]
    fn date_falls_back_to_filename() {
        let a = artifact("decisions/2026-01-01-db.md", FrontMatter::new());
        assert_eq!(a.date(), NaiveDate::from_ymd_opt(2026, 1, 1));
        let b = artifact("decisions/db.md", FrontMatter::new());
        assert_eq!(b.date(), None);
    }
}
