use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("not initialized: run 'trail init'")]
    NotInitialized,

    #[error("no sessions exist: run 'trail session start <slug>' first")]
    NoSessionsExist,

    #[error("session not found: {0} (run 'trail session list' to see known sessions)")]
    SessionNotFound(String),

    #[error("session already exists: {0}")]
    SessionExists(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),

    #[error("unknown command: {0} (run 'trail commands' to list them)")]
    UnknownCommand(String),

    #[error("artifact not found: {kind} in session '{session}'")]
    ArtifactNotFound { session: String, kind: String },

    #[error(
        "missing prerequisite '{kind}' for '{command}' in session '{session}': run '{producer}' first"
    )]
    MissingPrerequisite {
        session: String,
        command: String,
        kind: String,
        producer: String,
    },

    #[error("malformed artifact {path}: {reason}")]
    MalformedArtifact { path: String, reason: String },

    #[error("artifact already exists: {0} and every numbered variant is taken (choose a different --topic)")]
    DuplicateArtifact(String),

    #[error("write mode '{mode}' does not apply to {lifecycle} kind '{kind}'")]
    LifecycleMismatch {
        kind: String,
        lifecycle: String,
        mode: String,
    },

    #[error("command is in stage {actual}, expected {expected}")]
    InvalidStage { expected: String, actual: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TrailError>;
