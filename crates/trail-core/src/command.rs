//! Static capability table: what each workflow command produces and reads.
//!
//! Inputs are either an exact kind (`spec`) or "latest by prefix" (`review`),
//! and either required or optional. A missing optional input is a normal
//! branch for the command; a missing required one stops the invocation.

use crate::error::{Result, TrailError};
use crate::types::ArtifactKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "select", content = "name", rename_all = "snake_case")]
pub enum Select {
    /// `ArtifactStore::read` of exactly this kind.
    Kind(&'static str),
    /// `ArtifactStore::read_latest` over kinds starting with this prefix.
    Latest(&'static str),
}

impl Select {
    pub fn name(self) -> &'static str {
        match self {
            Select::Kind(n) | Select::Latest(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputDecl {
    /// Key the loaded artifact is recorded under in `related`.
    pub name: &'static str,
    pub select: Select,
    pub required: bool,
}

const fn optional(name: &'static str) -> InputDecl {
    InputDecl {
        name,
        select: Select::Kind(name),
        required: false,
    }
}

const fn required(name: &'static str) -> InputDecl {
    InputDecl {
        name,
        select: Select::Kind(name),
        required: true,
    }
}

const fn latest(name: &'static str, prefix: &'static str) -> InputDecl {
    InputDecl {
        name,
        select: Select::Latest(prefix),
        required: false,
    }
}

#[derive(Debug, Serialize)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Kind name, or `review` for the `review:<subtype>` family.
    pub produces: &'static str,
    pub inputs: &'static [InputDecl],
    pub summary: &'static str,
}

static REGISTRY: &[CommandSpec] = &[
    CommandSpec {
        name: "spec-crystallize",
        produces: "spec",
        inputs: &[],
        summary: "Turn a rough request into a session spec",
    },
    CommandSpec {
        name: "triage",
        produces: "triage",
        inputs: &[optional("spec")],
        summary: "Classify scope, urgency, and delivery mode",
    },
    CommandSpec {
        name: "research-plan",
        produces: "plan",
        inputs: &[optional("spec")],
        summary: "Research the codebase and write an implementation plan",
    },
    CommandSpec {
        name: "risk-assessment",
        produces: "risk-assessment",
        inputs: &[optional("spec"), optional("plan")],
        summary: "Build the risk register for the planned change",
    },
    CommandSpec {
        name: "test-matrix",
        produces: "test-matrix",
        inputs: &[required("spec"), optional("plan")],
        summary: "Derive the test matrix from the session spec",
    },
    // The work under review is the working tree, which has no artifact kind;
    // the spec is loaded in its place as the description of that work.
    CommandSpec {
        name: "review",
        produces: "review",
        inputs: &[optional("plan"), optional("spec")],
        summary: "Review the work through one lens (review:<subtype>)",
    },
    CommandSpec {
        name: "prod-readiness",
        produces: "prod-readiness",
        inputs: &[optional("plan"), latest("review", "review")],
        summary: "Check operational readiness before shipping",
    },
    CommandSpec {
        name: "ship-plan",
        produces: "ship-plan",
        inputs: &[required("plan"), optional("prod-readiness")],
        summary: "Sequence the rollout and rollback steps",
    },
    CommandSpec {
        name: "decision-record",
        produces: "decision",
        inputs: &[optional("plan"), latest("previous", "decision")],
        summary: "Record a decision; may supersede an earlier one",
    },
    CommandSpec {
        name: "handoff",
        produces: "handoff",
        inputs: &[optional("spec"), optional("plan"), optional("ship-plan")],
        summary: "Summarize the session for the next owner",
    },
    CommandSpec {
        name: "rca",
        produces: "rca",
        inputs: &[optional("ship-plan"), latest("handoff", "handoff")],
        summary: "Post-incident root-cause analysis",
    },
];

pub fn registry() -> &'static [CommandSpec] {
    REGISTRY
}

/// A resolved invocation name: `review:security` → spec `review`, kind `review-security`.
#[derive(Debug, Clone)]
pub struct Command {
    pub spec: &'static CommandSpec,
    pub name: String,
    pub produces: ArtifactKind,
}

impl Command {
    pub fn lookup(name: &str) -> Result<Self> {
        let (base, subtype) = match name.split_once(':') {
            Some((b, s)) => (b, Some(s)),
            None => (name, None),
        };
        let spec = REGISTRY
            .iter()
            .find(|c| c.name == base)
            .ok_or_else(|| TrailError::UnknownCommand(name.to_string()))?;

        let produces = match (spec.produces, subtype) {
            ("review", Some(sub)) => format!("review-{sub}")
                .parse()
                .map_err(|_| TrailError::UnknownCommand(name.to_string()))?,
            ("review", None) | (_, Some(_)) => {
                return Err(TrailError::UnknownCommand(name.to_string()));
            }
            (kind, None) => kind.parse()?,
        };
        Ok(Self {
            spec,
            name: name.to_string(),
            produces,
        })
    }

    pub fn inputs(&self) -> &'static [InputDecl] {
        self.spec.inputs
    }
}

/// Command to suggest when an artifact named `kind` (or prefix) is missing.
pub fn producer_of(kind: &str) -> String {
    if kind.starts_with("review") {
        return "trail run review:<subtype>".to_string();
    }
    REGISTRY
        .iter()
        .find(|c| c.produces == kind)
        .map(|c| format!("trail run {}", c.name))
        .unwrap_or_else(|| format!("the command that produces '{kind}'"))
}
