#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn trail(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("trail").unwrap();
    cmd.current_dir(dir.path()).env("TRAIL_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    trail(dir).arg("init").assert().success();
}

fn start_session(dir: &TempDir, slug: &str) {
    trail(dir)
        .args(["session", "start", slug, "--title", "CSV import"])
        .assert()
        .success();
}

fn run_cmd(dir: &TempDir, command: &str, body: &str) -> assert_cmd::assert::Assert {
    trail(dir).args(["run", command]).write_stdin(body).assert()
}

fn manifest(dir: &TempDir, slug: &str) -> serde_yaml::Value {
    let path = dir
        .path()
        .join(format!(".trail/sessions/{slug}/manifest.yaml"));
    serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// trail init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    trail(&dir).arg("init").assert().success();

    assert!(dir.path().join(".trail").is_dir());
    assert!(dir.path().join(".trail/sessions").is_dir());
    assert!(dir.path().join(".trail/config.yaml").exists());

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.lines().any(|l| l == ".trail/index.lock"));
    assert!(gitignore.lines().any(|l| l == ".trail/sessions/*/.lock"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    trail(&dir).arg("init").assert().success();
    trail(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));

    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore.matches(".trail/index.lock").count(), 1);
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    trail(&dir)
        .args(["session", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trail init"));
}

// ---------------------------------------------------------------------------
// trail session
// ---------------------------------------------------------------------------

#[test]
fn session_start_list_and_current() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "zzz-first");
    start_session(&dir, "aaa-second");

    trail(&dir)
        .args(["session", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zzz-first"))
        .stdout(predicate::str::contains("aaa-second"));

    trail(&dir)
        .args(["session", "current"])
        .assert()
        .success()
        .stdout("aaa-second\n");

    assert!(dir
        .path()
        .join(".trail/sessions/zzz-first/README.md")
        .exists());
    let projection = std::fs::read_to_string(dir.path().join(".trail/sessions/README.md")).unwrap();
    let first = projection.find("zzz-first").unwrap();
    let second = projection.find("aaa-second").unwrap();
    assert!(first < second);
}

#[test]
fn session_start_records_metadata() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    trail(&dir)
        .args([
            "session", "start", "csv-import", "--title", "CSV", "--meta", "owner=ana",
        ])
        .assert()
        .success();

    let m = manifest(&dir, "csv-import");
    assert_eq!(m["metadata"]["owner"].as_str(), Some("ana"));
}

#[test]
fn session_start_rejects_duplicates_and_bad_slugs() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    trail(&dir)
        .args(["session", "start", "csv-import", "--title", "Again"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    trail(&dir)
        .args(["session", "start", "Bad Slug", "--title", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid slug"));
}

#[test]
fn no_sessions_is_an_actionable_error() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    run_cmd(&dir, "spec-crystallize", "# Spec")
        .failure()
        .stderr(predicate::str::contains("trail session start"));
}

#[test]
fn unknown_session_is_reported() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    trail(&dir)
        .args(["artifact", "list", "--session", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session not found: ghost"));
}

// ---------------------------------------------------------------------------
// trail run
// ---------------------------------------------------------------------------

#[test]
fn run_writes_artifact_and_checks_off() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    run_cmd(&dir, "spec-crystallize", "first spec\n")
        .success()
        .stdout(predicate::str::contains("csv-import/spec/spec.md"));
    run_cmd(&dir, "spec-crystallize", "second spec\n").success();

    let spec = std::fs::read_to_string(
        dir.path()
            .join(".trail/sessions/csv-import/spec/spec.md"),
    )
    .unwrap();
    assert!(spec.starts_with("---\n"));
    assert!(spec.contains("command: spec-crystallize"));
    assert!(spec.contains("second spec"));
    assert!(!spec.contains("first spec"));

    let m = manifest(&dir, "csv-import");
    let items = m["checklist"]["items"].as_sequence().unwrap();
    let spec_item = items
        .iter()
        .find(|i| i["kind"].as_str() == Some("spec"))
        .unwrap();
    assert_eq!(spec_item["done"].as_bool(), Some(true));
    assert_eq!(spec_item["path"].as_str(), Some("spec/spec.md"));

    let readme =
        std::fs::read_to_string(dir.path().join(".trail/sessions/csv-import/README.md")).unwrap();
    assert!(readme.contains("[x]"));
    assert!(readme.contains("spec-crystallize: wrote spec/spec.md"));
}

#[test]
fn run_with_missing_prerequisite_changes_nothing() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    let before = manifest(&dir, "csv-import");

    run_cmd(&dir, "test-matrix", "matrix")
        .failure()
        .stderr(predicate::str::contains("missing prerequisite 'spec'"))
        .stderr(predicate::str::contains("trail run spec-crystallize"));

    assert_eq!(manifest(&dir, "csv-import"), before);
    assert!(!dir
        .path()
        .join(".trail/sessions/csv-import/plan/test-matrix.md")
        .exists());
}

#[test]
fn run_records_related_inputs() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    run_cmd(&dir, "spec-crystallize", "spec").success();
    run_cmd(&dir, "research-plan", "plan").success();

    let output = trail(&dir)
        .args(["--json", "run", "ship-plan"])
        .write_stdin("ship it")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(json["artifact"]["path"].as_str(), Some("ship/ship-plan.md"));
    let missing = json["missing_inputs"].as_sequence().unwrap();
    assert_eq!(missing[0].as_str(), Some("prod-readiness"));

    trail(&dir)
        .args(["artifact", "show", "ship-plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plan: plan/plan.md"))
        .stdout(predicate::str::contains("ship it"));
}

#[test]
fn run_reads_body_from_file() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    std::fs::write(dir.path().join("triage.md"), "small, low risk\n").unwrap();

    trail(&dir)
        .args(["run", "triage", "--file", "triage.md"])
        .assert()
        .success();
    trail(&dir)
        .args(["artifact", "show", "triage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("small, low risk"));
}

#[test]
fn run_rejects_unknown_commands() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    run_cmd(&dir, "deploy", "x")
        .failure()
        .stderr(predicate::str::contains("unknown command: deploy"));
    run_cmd(&dir, "review", "x")
        .failure()
        .stderr(predicate::str::contains("unknown command: review"));
}

#[test]
fn reviews_accumulate_and_latest_wins() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    for (topic, body) in [("first", "one"), ("second", "two"), ("third", "three")] {
        trail(&dir)
            .args(["run", "review:overengineering", "--topic", topic])
            .write_stdin(body)
            .assert()
            .success();
    }

    let reviews = std::fs::read_dir(dir.path().join(".trail/sessions/csv-import/reviews"))
        .unwrap()
        .count();
    assert_eq!(reviews, 3);

    trail(&dir)
        .args(["artifact", "show", "review", "--latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("three"));
}

#[test]
fn same_day_runs_create_separate_instances() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    for body in ["first pass", "second pass"] {
        run_cmd(&dir, "review:security", body).success();
    }

    let mut names: Vec<String> =
        std::fs::read_dir(dir.path().join(".trail/sessions/csv-import/reviews"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with("-security-2.md"));
    assert!(names[1].ends_with("-security.md"));

    trail(&dir)
        .args(["artifact", "show", "review", "--latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second pass"));
}

#[test]
fn unreadable_body_file_is_reported_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    let before = manifest(&dir, "csv-import");

    trail(&dir)
        .args(["run", "spec-crystallize", "--file", "no-such-draft.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read artifact body"))
        .stderr(predicate::str::contains("no-such-draft.md"));

    assert!(!dir.path().join(".trail/sessions/csv-import/spec/spec.md").exists());
    assert_eq!(manifest(&dir, "csv-import"), before);
}

#[test]
fn decision_can_supersede_an_earlier_one() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    let output = trail(&dir)
        .args(["--json", "run", "decision-record", "--topic", "db"])
        .write_stdin("mysql")
        .output()
        .unwrap();
    let json: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    let first = json["artifact"]["path"].as_str().unwrap().to_string();

    trail(&dir)
        .args([
            "run",
            "decision-record",
            "--topic",
            "db-revisited",
            "--supersedes",
            &first,
        ])
        .write_stdin("postgres")
        .assert()
        .success();

    trail(&dir)
        .args(["artifact", "show", "decision", "--latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("supersedes: {first}")))
        .stdout(predicate::str::contains("postgres"));
}

// ---------------------------------------------------------------------------
// trail artifact / checklist
// ---------------------------------------------------------------------------

#[test]
fn artifact_write_append_mode_keeps_both_bodies() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    for body in ["part one", "part two"] {
        trail(&dir)
            .args(["artifact", "write", "plan", "--mode", "append"])
            .write_stdin(body)
            .assert()
            .success();
    }
    trail(&dir)
        .args(["artifact", "show", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("part one"))
        .stdout(predicate::str::contains("part two"));
}

#[test]
fn artifact_write_rejects_mode_for_wrong_lifecycle() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    trail(&dir)
        .args(["artifact", "write", "decision", "--mode", "overwrite"])
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not apply"));
}

#[test]
fn artifact_list_is_chronological() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");
    run_cmd(&dir, "spec-crystallize", "spec").success();
    run_cmd(&dir, "research-plan", "plan").success();

    trail(&dir)
        .args(["artifact", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spec/spec.md"))
        .stdout(predicate::str::contains("plan/plan.md"));
}

#[test]
fn checklist_mark_is_idempotent_and_log_appends() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    for _ in 0..2 {
        trail(&dir)
            .args(["checklist", "mark", "triage"])
            .assert()
            .success();
    }
    trail(&dir)
        .args(["checklist", "log", "talked to the data team"])
        .assert()
        .success();

    let m = manifest(&dir, "csv-import");
    let items = m["checklist"]["items"].as_sequence().unwrap();
    let triage = items
        .iter()
        .find(|i| i["kind"].as_str() == Some("triage"))
        .unwrap();
    assert_eq!(triage["done"].as_bool(), Some(true));
    let activity = m["checklist"]["activity"].as_sequence().unwrap();
    assert_eq!(
        activity.last().unwrap()["description"].as_str(),
        Some("talked to the data team")
    );
}

// ---------------------------------------------------------------------------
// trail next / commands / config
// ---------------------------------------------------------------------------

#[test]
fn next_follows_the_workflow() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    start_session(&dir, "csv-import");

    trail(&dir)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("trail run spec-crystallize"));

    run_cmd(&dir, "spec-crystallize", "spec").success();

    let output = trail(&dir).args(["--json", "next"]).output().unwrap();
    let json: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(json["action"].as_str(), Some("run"));
    assert_eq!(json["command"].as_str(), Some("triage"));
}

#[test]
fn commands_lists_the_registry() {
    let dir = TempDir::new().unwrap();
    trail(&dir)
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("spec-crystallize"))
        .stdout(predicate::str::contains("review:<subtype>"))
        .stdout(predicate::str::contains("test-matrix"));
}

#[test]
fn config_validate_passes_on_fresh_project() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    trail(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_flags_plural_merge_policy() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let path = dir.path().join(".trail/config.yaml");
    let mut config = std::fs::read_to_string(&path).unwrap();
    config.push_str("merge_policy:\n  decision: append\n");
    std::fs::write(&path, config).unwrap();

    trail(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}
