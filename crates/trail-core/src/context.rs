//! Orchestration of one command invocation.
//!
//! ```text
//! Resolving -> LoadingInputs -> Executing -> Persisting -> Done
//!      \             \              \             \
//!       +-------------+--------------+-------------+--> Failed
//! ```
//!
//! The artifact is written before the checklist is touched, so a failed
//! write never leaves a checked-off item or an activity entry behind.

use crate::artifact::{Artifact, ArtifactDraft, ArtifactRef, KEY_COMMAND, RELATED_SUPERSEDES};
use crate::checklist::ChecklistSynchronizer;
use crate::command::{producer_of, Command, InputDecl, Select};
use crate::config::Config;
use crate::error::{Result, TrailError};
use crate::paths;
use crate::resolver::SlugResolver;
use crate::store::ArtifactStore;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolving,
    LoadingInputs,
    Executing,
    Persisting,
    Done,
    Failed,
}

// ---------------------------------------------------------------------------
// LoadedInputs
// ---------------------------------------------------------------------------

/// Predecessor artifacts, in declaration order. `None` is an absent optional input.
#[derive(Debug, Default)]
pub struct LoadedInputs {
    entries: Vec<(InputDecl, Option<Artifact>)>,
}

impl LoadedInputs {
    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.entries
            .iter()
            .find(|(decl, _)| decl.name == name)
            .and_then(|(_, a)| a.as_ref())
    }

    /// Names of optional inputs that were not found; the command takes its fallback path.
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, a)| a.is_none())
            .map(|(decl, _)| decl.name)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InputDecl, Option<&Artifact>)> {
        self.entries.iter().map(|(d, a)| (d, a.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// CommandContext
// ---------------------------------------------------------------------------

pub struct CommandContext<'a> {
    config: &'a Config,
    command: Command,
    resolver: SlugResolver,
    store: ArtifactStore,
    checklist: ChecklistSynchronizer,
    stage: Stage,
    slug: Option<String>,
    inputs: LoadedInputs,
    supersedes: Option<String>,
}

impl<'a> CommandContext<'a> {
    pub fn new(root: &Path, config: &'a Config, command_name: &str) -> Result<Self> {
        Ok(Self {
            config,
            command: Command::lookup(command_name)?,
            resolver: SlugResolver::new(root),
            store: ArtifactStore::new(root),
            checklist: ChecklistSynchronizer::new(root),
            stage: Stage::Resolving,
            slug: None,
            inputs: LoadedInputs::default(),
            supersedes: None,
        })
    }

    /// Record `related.supersedes = path` on the artifact this invocation writes.
    pub fn supersedes(mut self, path: impl Into<String>) -> Self {
        self.supersedes = Some(path.into());
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn inputs(&self) -> &LoadedInputs {
        &self.inputs
    }

    /// Drive the whole invocation. `execute` produces the artifact content.
    pub fn run(
        &mut self,
        explicit_slug: Option<&str>,
        execute: impl FnOnce(&LoadedInputs) -> Result<ArtifactDraft>,
    ) -> Result<ArtifactRef> {
        self.resolve(explicit_slug)?;
        self.load_inputs()?;
        let draft = execute(&self.inputs);
        let draft = self.guard(draft)?;
        self.persist(draft)
    }

    // ---------------------------------------------------------------------------
    // Stages
    // ---------------------------------------------------------------------------

    pub fn resolve(&mut self, explicit_slug: Option<&str>) -> Result<&str> {
        self.require_stage(Stage::Resolving)?;
        let resolved = self.resolver.resolve(explicit_slug);
        let slug = self.guard(resolved)?;
        self.enter(Stage::LoadingInputs);
        Ok(self.slug.insert(slug).as_str())
    }

    pub fn load_inputs(&mut self) -> Result<&LoadedInputs> {
        self.require_stage(Stage::LoadingInputs)?;
        let loaded = self.try_load_inputs();
        self.inputs = self.guard(loaded)?;
        self.enter(Stage::Executing);
        Ok(&self.inputs)
    }

    /// Write the artifact, then check it off and log the invocation.
    pub fn persist(&mut self, draft: ArtifactDraft) -> Result<ArtifactRef> {
        self.require_stage(Stage::Executing)?;
        self.enter(Stage::Persisting);
        let written = self.try_persist(draft);
        let artifact = self.guard(written)?;
        self.enter(Stage::Done);
        Ok(artifact)
    }

    // ---------------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------------

    fn try_load_inputs(&self) -> Result<LoadedInputs> {
        let slug = self.current_slug()?;
        self.store.ensure_session(slug)?;

        let mut entries = Vec::with_capacity(self.command.inputs().len());
        for decl in self.command.inputs() {
            let found = match decl.select {
                Select::Kind(kind) => self.store.read(slug, &kind.parse()?),
                Select::Latest(prefix) => self.store.read_latest(slug, prefix),
            };
            let artifact = match found {
                Ok(a) => Some(a),
                Err(TrailError::ArtifactNotFound { .. }) if !decl.required => {
                    tracing::debug!(input = decl.name, "optional input absent");
                    None
                }
                Err(TrailError::ArtifactNotFound { .. }) => {
                    return Err(TrailError::MissingPrerequisite {
                        session: slug.to_string(),
                        command: self.command.name.clone(),
                        kind: decl.select.name().to_string(),
                        producer: producer_of(decl.select.name()),
                    });
                }
                Err(e) => return Err(e),
            };
            entries.push((*decl, artifact));
        }
        Ok(LoadedInputs { entries })
    }

    fn try_persist(&self, mut draft: ArtifactDraft) -> Result<ArtifactRef> {
        let slug = self.current_slug()?;
        let kind = &self.command.produces;

        draft
            .front_matter
            .insert(KEY_COMMAND, self.command.name.as_str());
        for (decl, artifact) in self.inputs.iter() {
            if let Some(a) = artifact {
                draft.front_matter.set_related(decl.name, a.path.as_str());
            }
        }
        if let Some(old) = &self.supersedes {
            if !paths::artifact_path(self.store.root(), slug, old).is_file() {
                return Err(TrailError::ArtifactNotFound {
                    session: slug.to_string(),
                    kind: old.clone(),
                });
            }
            draft.front_matter.set_related(RELATED_SUPERSEDES, old.as_str());
        }

        let date = draft.date;
        let mode = self.config.write_mode_for(kind);
        let written = self.store.write(slug, kind, draft, mode)?;

        self.checklist
            .mark_complete(slug, kind, Some(written.path.as_str()))?;
        self.checklist.append_activity(
            slug,
            date,
            &format!("{}: wrote {}", self.command.name, written.path),
        )?;
        Ok(written)
    }

    fn current_slug(&self) -> Result<&str> {
        self.slug.as_deref().ok_or(TrailError::NoSessionsExist)
    }

    fn require_stage(&mut self, stage: Stage) -> Result<()> {
        if self.stage == stage {
            return Ok(());
        }
        let err = TrailError::InvalidStage {
            expected: format!("{stage:?}"),
            actual: format!("{:?}", self.stage),
        };
        self.stage = Stage::Failed;
        Err(err)
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!(command = %self.command.name, stage = ?self.stage, error = %e, "command failed");
            self.stage = Stage::Failed;
        }
        result
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(command = %self.command.name, from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }
}
