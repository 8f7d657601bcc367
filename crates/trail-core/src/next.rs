use crate::checklist::ChecklistState;
use crate::command::{producer_of, Command, Select};
use crate::session::Session;
use crate::types::ArtifactKind;
use serde::Serialize;

/// Commands in the order a session normally runs them.
///
/// `decision-record` and `rca` are event-driven and never suggested.
pub const WORKFLOW: &[&str] = &[
    "spec-crystallize",
    "triage",
    "research-plan",
    "risk-assessment",
    "test-matrix",
    "review",
    "prod-readiness",
    "ship-plan",
    "handoff",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Run `command` to produce the next artifact.
    Run,
    /// Every remaining stage waits on a required input nobody has produced.
    Blocked,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextStep {
    pub session: String,
    pub action: NextAction,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<String>,
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

pub fn infer_next(session: &Session) -> NextStep {
    let checklist = &session.checklist;
    let mut blocked: Option<(&str, &str)> = None;

    for name in WORKFLOW {
        let Some(stage) = Stage::of(name) else {
            continue;
        };
        if !stage.is_tracked(checklist) || stage.is_complete(checklist) {
            continue;
        }
        match stage.missing_input(checklist) {
            None => {
                return NextStep {
                    session: session.slug.clone(),
                    action: NextAction::Run,
                    message: format!("{} has not been produced yet", stage.produces),
                    command: Some(stage.invocation()),
                    produces: Some(stage.produces.to_string()),
                };
            }
            Some(kind) => {
                blocked.get_or_insert((*name, kind));
            }
        }
    }

    match blocked {
        Some((name, kind)) => NextStep {
            session: session.slug.clone(),
            action: NextAction::Blocked,
            message: format!(
                "'{name}' needs '{kind}'; run '{}' first",
                producer_of(kind)
            ),
            command: Some(name.to_string()),
            produces: None,
        },
        None => NextStep {
            session: session.slug.clone(),
            action: NextAction::Done,
            message: "every tracked stage is complete".to_string(),
            command: None,
            produces: None,
        },
    }
}

struct Stage {
    command: Command,
    produces: &'static str,
}

impl Stage {
    fn of(name: &str) -> Option<Self> {
        // `review` needs a subtype to resolve; any one will do for the table lookup.
        let lookup = if name == "review" {
            "review:any"
        } else {
            name
        };
        let command = Command::lookup(lookup).ok()?;
        Some(Self {
            produces: command.spec.produces,
            command,
        })
    }

    fn is_review(&self) -> bool {
        self.produces == "review"
    }

    fn invocation(&self) -> String {
        if self.is_review() {
            "review:<subtype>".to_string()
        } else {
            self.command.name.clone()
        }
    }

    /// Stages whose kind was dropped from the configured checklist are skipped.
    fn is_tracked(&self, checklist: &ChecklistState) -> bool {
        self.is_review() || checklist.item(&self.command.produces).is_some()
    }

    fn is_complete(&self, checklist: &ChecklistState) -> bool {
        if self.is_review() {
            checklist.any_complete_with_prefix("review")
        } else {
            checklist.is_complete(&self.command.produces)
        }
    }

    fn missing_input(&self, checklist: &ChecklistState) -> Option<&'static str> {
        self.command
            .inputs()
            .iter()
            .filter(|i| i.required)
            .filter_map(|i| match i.select {
                Select::Kind(k) => Some(k),
                Select::Latest(_) => None,
            })
            .find(|k| {
                !k.parse::<ArtifactKind>()
                    .is_ok_and(|kind| checklist.is_complete(&kind))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn session(checklist: &[ArtifactKind]) -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("test");
        cfg.checklist = checklist.to_vec();
        let s = Session::create(dir.path(), &cfg, "auth-flow", "Auth", BTreeMap::new()).unwrap();
        (dir, s)
    }

    fn complete(s: &mut Session, kinds: &[ArtifactKind]) {
        for k in kinds {
            s.checklist.mark_complete(k, None);
        }
    }

    #[test]
    fn fresh_session_starts_with_spec() {
        let (_dir, s) = session(&Config::new("t").checklist);
        let next = infer_next(&s);
        assert_eq!(next.action, NextAction::Run);
        assert_eq!(next.command.as_deref(), Some("spec-crystallize"));
        assert_eq!(next.produces.as_deref(), Some("spec"));
    }

    #[test]
    fn walks_the_workflow_in_order() {
        let (_dir, mut s) = session(&Config::new("t").checklist);
        complete(
            &mut s,
            &[
                ArtifactKind::Spec,
                ArtifactKind::Triage,
                ArtifactKind::Plan,
                ArtifactKind::RiskAssessment,
                ArtifactKind::TestMatrix,
            ],
        );
        assert_eq!(
            infer_next(&s).command.as_deref(),
            Some("review:<subtype>")
        );

        complete(&mut s, &[ArtifactKind::review("security")]);
        assert_eq!(infer_next(&s).command.as_deref(), Some("prod-readiness"));
    }

    #[test]
    fn untracked_stages_are_skipped() {
        let (_dir, mut s) = session(&[ArtifactKind::Spec, ArtifactKind::ShipPlan]);
        complete(&mut s, &[ArtifactKind::Spec]);
        // ship-plan requires plan, which this checklist never tracks.
        let next = infer_next(&s);
        assert_eq!(next.command.as_deref(), Some("review:<subtype>"));

        complete(&mut s, &[ArtifactKind::review("perf")]);
        let next = infer_next(&s);
        assert_eq!(next.action, NextAction::Blocked);
        assert_eq!(next.command.as_deref(), Some("ship-plan"));
        assert!(next.message.contains("trail run research-plan"));
    }

    #[test]
    fn done_when_everything_is_complete() {
        let (_dir, mut s) = session(&[ArtifactKind::Spec, ArtifactKind::Handoff]);
        complete(
            &mut s,
            &[
                ArtifactKind::Spec,
                ArtifactKind::review("security"),
                ArtifactKind::Handoff,
            ],
        );
        let next = infer_next(&s);
        assert_eq!(next.action, NextAction::Done);
        assert!(next.command.is_none());
    }

    #[test]
    fn event_commands_are_never_suggested() {
        let (_dir, s) = session(&[ArtifactKind::Decision, ArtifactKind::Rca]);
        let next = infer_next(&s);
        assert_eq!(next.command.as_deref(), Some("review:<subtype>"));
    }

    #[test]
    fn every_workflow_stage_resolves() {
        for name in WORKFLOW {
            assert!(Stage::of(name).is_some(), "{name}");
        }
    }
}
