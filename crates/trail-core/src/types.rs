use crate::error::TrailError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Whether a kind has one live instance per session or one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Singular,
    Plural,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::Singular => "singular",
            Lifecycle::Plural => "plural",
        })
    }
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArtifactKind {
    Spec,
    Plan,
    Triage,
    RiskAssessment,
    ProdReadiness,
    ShipPlan,
    TestMatrix,
    /// `review-<subtype>`; the subtype is an open, slug-shaped label.
    Review(String),
    Decision,
    Handoff,
    Rca,
}

impl ArtifactKind {
    /// Every kind with a fixed name. Reviews are represented by their prefix.
    pub fn fixed() -> &'static [ArtifactKind] {
        &[
            ArtifactKind::Spec,
            ArtifactKind::Plan,
            ArtifactKind::Triage,
            ArtifactKind::RiskAssessment,
            ArtifactKind::ProdReadiness,
            ArtifactKind::ShipPlan,
            ArtifactKind::TestMatrix,
            ArtifactKind::Decision,
            ArtifactKind::Handoff,
            ArtifactKind::Rca,
        ]
    }

    pub fn review(subtype: impl Into<String>) -> Self {
        ArtifactKind::Review(subtype.into())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            ArtifactKind::Review(_)
            | ArtifactKind::Decision
            | ArtifactKind::Handoff
            | ArtifactKind::Rca => Lifecycle::Plural,
            _ => Lifecycle::Singular,
        }
    }

    pub fn is_plural(&self) -> bool {
        self.lifecycle() == Lifecycle::Plural
    }

    /// Session-relative directory holding artifacts of this kind.
    pub fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Spec => "spec",
            ArtifactKind::Plan | ArtifactKind::RiskAssessment | ArtifactKind::TestMatrix => "plan",
            ArtifactKind::Triage => "triage",
            ArtifactKind::ProdReadiness | ArtifactKind::ShipPlan => "ship",
            ArtifactKind::Review(_) => "reviews",
            ArtifactKind::Decision => "decisions",
            ArtifactKind::Handoff => "handoffs",
            ArtifactKind::Rca => "rca",
        }
    }

    /// Fixed session-relative path for singular kinds.
    pub fn singular_path(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Spec => Some("spec/spec.md"),
            ArtifactKind::Plan => Some("plan/plan.md"),
            ArtifactKind::Triage => Some("triage/triage.md"),
            ArtifactKind::RiskAssessment => Some("plan/risk-assessment.md"),
            ArtifactKind::TestMatrix => Some("plan/test-matrix.md"),
            ArtifactKind::ProdReadiness => Some("ship/prod-readiness.md"),
            ArtifactKind::ShipPlan => Some("ship/ship-plan.md"),
            _ => None,
        }
    }

    /// True when this kind's name starts with `prefix` (`review` matches every review).
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.to_string().starts_with(prefix)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Spec => f.write_str("spec"),
            ArtifactKind::Plan => f.write_str("plan"),
            ArtifactKind::Triage => f.write_str("triage"),
            ArtifactKind::RiskAssessment => f.write_str("risk-assessment"),
            ArtifactKind::ProdReadiness => f.write_str("prod-readiness"),
            ArtifactKind::ShipPlan => f.write_str("ship-plan"),
            ArtifactKind::TestMatrix => f.write_str("test-matrix"),
            ArtifactKind::Review(sub) => write!(f, "review-{sub}"),
            ArtifactKind::Decision => f.write_str("decision"),
            ArtifactKind::Handoff => f.write_str("handoff"),
            ArtifactKind::Rca => f.write_str("rca"),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spec" => Ok(ArtifactKind::Spec),
            "plan" => Ok(ArtifactKind::Plan),
            "triage" => Ok(ArtifactKind::Triage),
            "risk-assessment" | "risk_assessment" => Ok(ArtifactKind::RiskAssessment),
            "prod-readiness" | "prod_readiness" => Ok(ArtifactKind::ProdReadiness),
            "ship-plan" | "ship_plan" => Ok(ArtifactKind::ShipPlan),
            "test-matrix" | "test_matrix" => Ok(ArtifactKind::TestMatrix),
            "decision" => Ok(ArtifactKind::Decision),
            "handoff" => Ok(ArtifactKind::Handoff),
            "rca" => Ok(ArtifactKind::Rca),
            _ => match s.strip_prefix("review-") {
                Some(sub) if crate::paths::validate_slug(sub).is_ok() => {
                    Ok(ArtifactKind::Review(sub.to_string()))
                }
                _ => Err(TrailError::UnknownKind(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for ArtifactKind {
    type Error = TrailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        kind.to_string()
    }
}

// ---------------------------------------------------------------------------
// WriteMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Replace the single live instance.
    Overwrite,
    /// Append the body to the single live instance, merging front matter.
    Append,
    /// Derive a fresh dated path; never replaces an existing file.
    CreateNew,
}

impl WriteMode {
    /// The mode a kind is written with when nothing else is configured.
    pub fn default_for(kind: &ArtifactKind) -> Self {
        match kind.lifecycle() {
            Lifecycle::Singular => WriteMode::Overwrite,
            Lifecycle::Plural => WriteMode::CreateNew,
        }
    }

    pub fn applies_to(self, lifecycle: Lifecycle) -> bool {
        matches!(
            (self, lifecycle),
            (WriteMode::Overwrite | WriteMode::Append, Lifecycle::Singular)
                | (WriteMode::CreateNew, Lifecycle::Plural)
        )
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteMode::Overwrite => "overwrite",
            WriteMode::Append => "append",
            WriteMode::CreateNew => "create-new",
        })
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(WriteMode::Overwrite),
            "append" => Ok(WriteMode::Append),
            "create-new" | "create_new" => Ok(WriteMode::CreateNew),
            _ => Err(format!(
                "unknown write mode '{s}' (expected overwrite, append, create-new)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_parse_back() {
        for kind in ArtifactKind::fixed() {
            let parsed: ArtifactKind = kind.to_string().parse().unwrap();
            assert_eq!(&parsed, kind);
        }
        let review: ArtifactKind = "review-overengineering".parse().unwrap();
        assert_eq!(review, ArtifactKind::review("overengineering"));
    }

    #[test]
    fn kind_aliases() {
        assert_eq!(
            "risk_assessment".parse::<ArtifactKind>().unwrap(),
            ArtifactKind::RiskAssessment
        );
    }

    #[test]
    fn unknown_kinds_rejected() {
        for s in ["", "review", "review-", "review-Bad Subtype", "notes"] {
            assert!(
                matches!(s.parse::<ArtifactKind>(), Err(TrailError::UnknownKind(_))),
                "expected unknown: {s}"
            );
        }
    }

    #[test]
    fn lifecycles_are_explicit() {
        assert_eq!(ArtifactKind::Spec.lifecycle(), Lifecycle::Singular);
        assert_eq!(ArtifactKind::Plan.lifecycle(), Lifecycle::Singular);
        assert_eq!(ArtifactKind::review("security").lifecycle(), Lifecycle::Plural);
        assert_eq!(ArtifactKind::Decision.lifecycle(), Lifecycle::Plural);
        assert_eq!(ArtifactKind::Rca.lifecycle(), Lifecycle::Plural);
        for kind in ArtifactKind::fixed() {
            assert_eq!(kind.singular_path().is_some(), !kind.is_plural(), "{kind}");
        }
    }

    #[test]
    fn prefix_matching() {
        assert!(ArtifactKind::review("security").matches_prefix("review"));
        assert!(ArtifactKind::review("security").matches_prefix("review-sec"));
        assert!(!ArtifactKind::Decision.matches_prefix("review"));
    }

    #[test]
    fn kind_serializes_as_string() {
        let yaml = serde_yaml::to_string(&ArtifactKind::review("perf")).unwrap();
        assert_eq!(yaml.trim(), "review-perf");
        let back: ArtifactKind = serde_yaml::from_str("ship-plan").unwrap();
        assert_eq!(back, ArtifactKind::ShipPlan);
    }

    #[test]
    fn write_modes_match_lifecycles() {
        assert!(WriteMode::Overwrite.applies_to(Lifecycle::Singular));
        assert!(WriteMode::Append.applies_to(Lifecycle::Singular));
        assert!(!WriteMode::CreateNew.applies_to(Lifecycle::Singular));
        assert!(WriteMode::CreateNew.applies_to(Lifecycle::Plural));
        assert!(!WriteMode::Overwrite.applies_to(Lifecycle::Plural));
        assert_eq!(WriteMode::default_for(&ArtifactKind::Handoff), WriteMode::CreateNew);
    }
}
