// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides recording tasks, playbook file builders and temp test environments

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::fs;

use flowbook::engine::{ExecutionError, PlaybookEngine, TaskContext, WorkContext, WorkReport};
use flowbook::tasks::Executable;

/// Shared, ordered record of which units ran
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }
}

/// What a recording task does after writing its data to the journal
#[derive(Clone, Copy)]
pub enum Behavior {
    Complete,
    Fail,
    Sleep(Duration),
    Fault,
}

/// Records its `data` into a journal and then behaves as configured
pub struct RecordingTask {
    name: &'static str,
    journal: Journal,
    behavior: Behavior,
}

#[async_trait]
impl Executable for RecordingTask {
    async fn execute(
        &self,
        work: &WorkContext,
        task: &TaskContext,
    ) -> Result<WorkReport, ExecutionError> {
        let data = task.data().unwrap_or(self.name).to_string();
        match self.behavior {
            Behavior::Complete => {
                self.journal.record(data);
                Ok(WorkReport::completed(work.clone()))
            }
            Behavior::Fail => {
                self.journal.record(data.clone());
                Ok(WorkReport::failed(work.clone(), format!("{} failed", data)))
            }
            Behavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                self.journal.record(data);
                Ok(WorkReport::completed(work.clone()))
            }
            Behavior::Fault => Err(ExecutionError::TaskFailed {
                task: self.name.to_string(),
                message: "fault injected".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Counts how many times it has been executed across every instance
pub struct CountingTask {
    counter: Arc<AtomicUsize>,
}

#[async_trait]
impl Executable for CountingTask {
    async fn execute(
        &self,
        work: &WorkContext,
        _task: &TaskContext,
    ) -> Result<WorkReport, ExecutionError> {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        work.put("count", count as u64).await;
        // Odd iterations fail so repeat counts never depend on status
        if count % 2 == 1 {
            Ok(WorkReport::failed(work.clone(), "odd iteration"))
        } else {
            Ok(WorkReport::completed(work.clone()))
        }
    }

    fn name(&self) -> &str {
        "count"
    }
}

/// Engine with the built-ins plus recording tasks:
/// `record`, `fail`, `slow` (200ms), `lagging` (1.5s), `stuck` (30s), `fault` and `count`
pub fn recording_engine(journal: &Journal) -> (PlaybookEngine, Arc<AtomicUsize>) {
    let mut engine = PlaybookEngine::new();
    let recorders = [
        ("record", Behavior::Complete),
        ("fail", Behavior::Fail),
        ("slow", Behavior::Sleep(Duration::from_millis(200))),
        ("lagging", Behavior::Sleep(Duration::from_millis(1500))),
        ("stuck", Behavior::Sleep(Duration::from_secs(30))),
        ("fault", Behavior::Fault),
    ];
    for (name, behavior) in recorders {
        let journal = journal.clone();
        engine.register(name, move || RecordingTask {
            name,
            journal: journal.clone(),
            behavior,
        });
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let shared = Arc::clone(&counter);
    engine.register("count", move || CountingTask {
        counter: Arc::clone(&shared),
    });

    (engine, counter)
}

/// Builds playbook YAML for file-based tests
pub struct TestPlaybookBuilder {
    id: String,
    vars: Vec<(String, String)>,
    tasks: Vec<String>,
}

impl TestPlaybookBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            vars: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a raw task item; continuation lines are indented by the caller
    pub fn with_task_yaml(mut self, yaml: &str) -> Self {
        self.tasks.push(yaml.to_string());
        self
    }

    pub fn add_log_task(self, message: &str) -> Self {
        self.with_task_yaml(&format!("- log: \"{}\"", message))
    }

    pub fn add_set_task(self, assignment: &str) -> Self {
        self.with_task_yaml(&format!("- set: \"{}\"", assignment))
    }

    pub fn add_when_task(self, condition: &str) -> Self {
        self.with_task_yaml(&format!("- when: \"{}\"", condition))
    }

    pub fn generate_yaml(&self) -> String {
        let mut yaml = format!("id: {}\n", self.id);

        if !self.vars.is_empty() {
            yaml.push_str("vars:\n");
            for (key, value) in &self.vars {
                yaml.push_str(&format!("  {}: \"{}\"\n", key, value));
            }
        }

        yaml.push_str("workflow:\n");
        for task in &self.tasks {
            for line in task.lines() {
                yaml.push_str(&format!("  {}\n", line));
            }
        }
        yaml
    }

    pub async fn write_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, self.generate_yaml()).await?;
        Ok(())
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn playbook_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.yaml", name))
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}_output.json", name))
    }

    pub async fn create_playbook_file(&self, name: &str, builder: &TestPlaybookBuilder) -> PathBuf {
        let playbook_file = self.playbook_file(name);
        builder
            .write_to_file(&playbook_file)
            .await
            .expect("Failed to write playbook file");
        playbook_file
    }

    pub async fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content)
            .await
            .expect("Failed to write test file");
        path
    }
}
