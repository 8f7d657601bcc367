use crate::error::{Result, TrailError};
use crate::paths;
use crate::types::{ArtifactKind, Lifecycle, WriteMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MergePolicy
// ---------------------------------------------------------------------------

/// How re-running a command merges into an existing singular artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[default]
    Overwrite,
    Append,
}

impl From<MergePolicy> for WriteMode {
    fn from(p: MergePolicy) -> Self {
        match p {
            MergePolicy::Overwrite => WriteMode::Overwrite,
            MergePolicy::Append => WriteMode::Append,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    /// Kinds seeded as unchecked items in every new session's checklist.
    #[serde(default = "default_checklist")]
    pub checklist: Vec<ArtifactKind>,
    /// Per-kind merge policy for singular kinds. Unlisted kinds overwrite.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub merge_policy: BTreeMap<ArtifactKind, MergePolicy>,
}

fn default_version() -> u32 {
    1
}

fn default_checklist() -> Vec<ArtifactKind> {
    vec![
        ArtifactKind::Spec,
        ArtifactKind::Triage,
        ArtifactKind::Plan,
        ArtifactKind::RiskAssessment,
        ArtifactKind::TestMatrix,
        ArtifactKind::ProdReadiness,
        ArtifactKind::ShipPlan,
        ArtifactKind::Handoff,
    ]
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            project: ProjectConfig {
                name: project_name.into(),
            },
            checklist: default_checklist(),
            merge_policy: BTreeMap::new(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(TrailError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Write mode a command producing `kind` persists with.
    pub fn write_mode_for(&self, kind: &ArtifactKind) -> WriteMode {
        match kind.lifecycle() {
            Lifecycle::Plural => WriteMode::CreateNew,
            Lifecycle::Singular => self
                .merge_policy
                .get(kind)
                .copied()
                .unwrap_or_default()
                .into(),
        }
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.project.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "project.name is empty".to_string(),
            });
        }

        for (i, kind) in self.checklist.iter().enumerate() {
            if self.checklist[..i].contains(kind) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("checklist lists '{kind}' more than once"),
                });
            }
        }

        for (kind, policy) in &self.merge_policy {
            if kind.is_plural() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "merge_policy for '{kind}' has no effect: plural kinds always create a new file"
                    ),
                });
            } else if *policy == MergePolicy::Overwrite {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("merge_policy for '{kind}' repeats the default (overwrite)"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
