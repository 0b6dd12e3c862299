// ABOUTME: Integration tests for the CLI application
// ABOUTME: Runs the flowbook binary against playbook files and checks its output

use std::process::{Command, Output};

mod common;
use common::{TestEnvironment, TestPlaybookBuilder};

fn flowbook(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowbook"))
        .args(args)
        .output()
        .expect("Failed to execute flowbook")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[tokio::test]
async fn test_cli_help_command() {
    let output = flowbook(&["--help"]);

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("flowbook"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("validate"));
}

#[tokio::test]
async fn test_cli_version_command() {
    let output = flowbook(&["--version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(flowbook::VERSION));
}

#[tokio::test]
async fn test_cli_run_simple_playbook() {
    let env = TestEnvironment::new();
    let builder = TestPlaybookBuilder::new("cli_simple")
        .add_log_task("Hello from the CLI")
        .add_set_task("done = true");
    let path = env.create_playbook_file("simple", &builder).await;

    let output = flowbook(&["run", path.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("finished with status: COMPLETED"));
}

#[tokio::test]
async fn test_cli_run_failing_playbook() {
    let env = TestEnvironment::new();
    let builder = TestPlaybookBuilder::new("cli_failing")
        .add_when_task("false")
        .add_log_task("never logged");
    let path = env.create_playbook_file("failing", &builder).await;

    let output = flowbook(&["run", path.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stdout(&output).contains("finished with status: FAILED"));
}

#[tokio::test]
async fn test_cli_run_with_variables() {
    let env = TestEnvironment::new();
    let builder = TestPlaybookBuilder::new("cli_vars")
        .add_when_task("env == 'prod' and replicas == 3")
        .add_log_task("deploying {{ replicas }} replicas");
    let path = env.create_playbook_file("vars", &builder).await;

    let without = flowbook(&["run", path.to_str().unwrap()]);
    assert!(!without.status.success());

    let with = flowbook(&[
        "run",
        path.to_str().unwrap(),
        "-V",
        "env=prod",
        "--var",
        "replicas=3",
    ]);
    assert!(with.status.success());
}

#[tokio::test]
async fn test_cli_run_with_output_file() {
    let env = TestEnvironment::new();
    let output_file = env.output_file("cli_output");
    let builder = TestPlaybookBuilder::new("cli_output")
        .with_var("region", "eu")
        .with_task_yaml(
            r#"- parallel:
    - set: a = 1
    - set: b = 2"#,
        );
    let path = env.create_playbook_file("output", &builder).await;

    let output = flowbook(&[
        "run",
        path.to_str().unwrap(),
        "--output",
        output_file.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Branch 0: COMPLETED"));
    assert!(stdout.contains("Branch 1: COMPLETED"));

    let summary: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&output_file).await.unwrap()).unwrap();
    assert_eq!(summary["playbook"], "cli_output");
    assert_eq!(summary["status"], "COMPLETED");
    assert_eq!(summary["branches"], serde_json::json!(["COMPLETED", "COMPLETED"]));
    assert_eq!(summary["context"]["region"], "eu");
    assert_eq!(summary["context"]["b"], 2);
}

#[tokio::test]
async fn test_cli_selects_playbook_by_id() {
    let env = TestEnvironment::new();
    let path = env
        .write_file(
            "many.yaml",
            r#"
- id: broken
  workflow:
    - when: "false"
- id: working
  workflow:
    - log: fine
"#,
        )
        .await;

    let first = flowbook(&["run", path.to_str().unwrap()]);
    assert!(!first.status.success());

    let chosen = flowbook(&["run", path.to_str().unwrap(), "--playbook", "working"]);
    assert!(chosen.status.success());

    let missing = flowbook(&["run", path.to_str().unwrap(), "-p", "absent"]);
    assert!(!missing.status.success());
}

#[tokio::test]
async fn test_cli_dry_run() {
    let env = TestEnvironment::new();
    let valid = TestPlaybookBuilder::new("dry").add_when_task("false");
    let valid_path = env.create_playbook_file("dry", &valid).await;

    // A failing guard is only evaluated on a real run
    let output = flowbook(&["run", valid_path.to_str().unwrap(), "--dry-run"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("is valid"));

    let unknown = TestPlaybookBuilder::new("dry_unknown").with_task_yaml("- frobnicate: now");
    let unknown_path = env.create_playbook_file("dry_unknown", &unknown).await;

    let output = flowbook(&["run", unknown_path.to_str().unwrap(), "--dry-run"]);
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_cli_validate_playbooks() {
    let env = TestEnvironment::new();
    let path = env
        .write_file(
            "mixed.yaml",
            r#"
id: good
workflow:
  - log: hello
---
id: bad
workflow:
  - block: []
"#,
        )
        .await;

    let output = flowbook(&["validate", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("✓ Playbook 'good'"));
    assert!(stdout.contains("✗ Playbook 'bad'"));
}

#[tokio::test]
async fn test_cli_list_tasks() {
    let output = flowbook(&["tasks"]);

    assert!(output.status.success());
    let stdout = stdout(&output);
    for id in ["evaluate", "log", "noop", "set", "when"] {
        assert!(stdout.lines().any(|line| line == id), "missing task {}", id);
    }
}

#[tokio::test]
async fn test_cli_init_creates_runnable_playbook() {
    let env = TestEnvironment::new();
    let dir = env.path().to_str().unwrap();

    let output = flowbook(&["init", "starter", "--output-dir", dir]);
    assert!(output.status.success());

    let path = env.playbook_file("starter");
    assert!(path.exists());

    let run = flowbook(&["run", path.to_str().unwrap()]);
    assert!(run.status.success());

    // A second init must not overwrite the file
    let again = flowbook(&["init", "starter", "--output-dir", dir]);
    assert!(!again.status.success());
}

#[tokio::test]
async fn test_cli_nonexistent_playbook_file() {
    let output = flowbook(&["run", "/nonexistent/playbook.yaml"]);
    assert!(!output.status.success());
}
