// ABOUTME: Command implementations for the flowbook CLI
// ABOUTME: Handles run, validate, tasks and init

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::info;

use super::config::Config;
use crate::engine::{PlaybookEngine, WorkContext, WorkReport, WorkStatus};
use crate::expression::Vars;
use crate::playbook::{Playbook, PlaybookParser};

/// Summary of a run, written with `--output`
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub playbook: String,
    pub status: WorkStatus,
    pub error: Option<String>,
    pub branches: Option<Vec<WorkStatus>>,
    pub context: Vars,
}

impl RunSummary {
    pub async fn from_report(playbook: &Playbook, report: &WorkReport) -> Self {
        Self {
            playbook: playbook.id.clone(),
            status: report.status(),
            error: report.error().map(str::to_string),
            branches: report
                .as_parallel()
                .map(|parallel| parallel.reports().iter().map(WorkReport::status).collect()),
            context: report.context().snapshot().await,
        }
    }
}

/// Run one playbook from a file
pub async fn run_playbook(
    path: PathBuf,
    playbook_id: Option<String>,
    dry_run: bool,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!("Loading playbooks from {}", path.display());

    let playbooks = load_playbooks(&path).await?;
    let playbook = select_playbook(&playbooks, playbook_id.as_deref())?;
    let engine = PlaybookEngine::new();

    if dry_run {
        engine
            .compile(playbook)
            .map_err(|e| anyhow!("Playbook '{}' is invalid: {}", playbook.id, e))?;
        println!("✓ Playbook '{}' is valid", playbook.id);
        return Ok(());
    }

    let initial = WorkContext::new();
    for (key, value) in &config.vars {
        initial.put(key.clone(), parse_value(value)).await;
    }

    let report = engine
        .run(playbook, Some(initial))
        .await
        .map_err(|e| anyhow!("Playbook '{}' could not run: {}", playbook.id, e))?;

    println!(
        "Playbook '{}' finished with status: {}",
        playbook.label(),
        report.status()
    );
    if let Some(parallel) = report.as_parallel() {
        for (index, branch) in parallel.reports().iter().enumerate() {
            println!("  Branch {}: {}", index, branch.status());
        }
    }
    if let Some(error) = report.error() {
        println!("  Error: {}", error);
    }

    if let Some(output_path) = output {
        let summary = RunSummary::from_report(playbook, &report).await;
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| anyhow!("Failed to serialize run summary: {}", e))?;
        tokio::fs::write(&output_path, json).await.map_err(|e| {
            anyhow!("Failed to write output file '{}': {}", output_path.display(), e)
        })?;
        info!("Run summary written to: {}", output_path.display());
    }

    match report.status() {
        WorkStatus::Completed => Ok(()),
        WorkStatus::Failed => Err(anyhow!("Playbook '{}' failed", playbook.id)),
    }
}

/// Load and compile every playbook in a file
pub async fn validate_playbooks(path: PathBuf) -> Result<()> {
    info!("Validating playbooks in {}", path.display());

    let playbooks = load_playbooks(&path).await?;
    let engine = PlaybookEngine::new();

    let mut invalid = 0;
    for playbook in &playbooks {
        match engine.compile(playbook) {
            Ok(flow) => println!(
                "✓ Playbook '{}' is valid ({} steps)",
                playbook.id,
                flow.steps().len()
            ),
            Err(e) => {
                invalid += 1;
                println!("✗ Playbook '{}': {}", playbook.id, e);
            }
        }
    }

    if invalid > 0 {
        return Err(anyhow!(
            "{} of {} playbooks failed validation",
            invalid,
            playbooks.len()
        ));
    }
    Ok(())
}

/// Print the registered task ids
pub fn list_tasks() -> Result<()> {
    let engine = PlaybookEngine::new();
    for id in engine.registry().list() {
        println!("{}", id);
    }
    Ok(())
}

/// Create a starter playbook file
pub async fn init_playbook(name: String, output_dir: PathBuf) -> Result<()> {
    info!("Initializing playbook '{}' in {}", name, output_dir.display());

    tokio::fs::create_dir_all(&output_dir).await?;
    let playbook_file = output_dir.join(format!("{}.yaml", name));
    if playbook_file.exists() {
        return Err(anyhow!(
            "Playbook file already exists: {}",
            playbook_file.display()
        ));
    }

    tokio::fs::write(&playbook_file, starter_playbook(&name)).await?;
    println!("Created playbook file: {}", playbook_file.display());
    Ok(())
}

async fn load_playbooks(path: &Path) -> Result<Vec<Playbook>> {
    let playbooks = PlaybookParser::new()
        .parse_file(path)
        .await
        .map_err(|e| anyhow!("Failed to parse playbook file: {}", e))?;
    if playbooks.is_empty() {
        return Err(anyhow!("No playbooks found in {}", path.display()));
    }
    Ok(playbooks)
}

fn select_playbook<'a>(playbooks: &'a [Playbook], id: Option<&str>) -> Result<&'a Playbook> {
    match id {
        Some(id) => playbooks
            .iter()
            .find(|playbook| playbook.id == id)
            .ok_or_else(|| anyhow!("Playbook '{}' not found", id)),
        None => playbooks
            .first()
            .ok_or_else(|| anyhow!("No playbooks to run")),
    }
}

/// Interpret a CLI value as a YAML scalar so `true` and `3` keep their types
fn parse_value(value: &str) -> JsonValue {
    match serde_yaml::from_str::<JsonValue>(value) {
        Ok(JsonValue::Null) | Err(_) => JsonValue::String(value.to_string()),
        Ok(parsed @ (JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_))) => parsed,
        Ok(_) => JsonValue::String(value.to_string()),
    }
}

fn starter_playbook(name: &str) -> String {
    format!(
        r#"id: {}
name: A starter playbook
vars:
  greeting: hello
workflow:
  - log: "{{{{ greeting }}}} from {}"
  - set: started = true
  - parallel:
    threads: 2
    timeout: 10
    tasks:
      - log: first branch
      - log: second branch
  - block:
      - when: started == true
      - log: inside the block
  - log: done
    repeat: 2
"#,
        name, name
    )
}
