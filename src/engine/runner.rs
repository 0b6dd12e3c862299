// ABOUTME: Engine entry point owning the task registry, playbook store and evaluator
// ABOUTME: Compiles, seeds the run context and executes playbooks

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::compiler::FlowCompiler;
use super::context::WorkContext;
use super::error::{ExecutionError, Result};
use super::report::WorkReport;
use crate::expression::{Evaluator, ExpressionEngine};
use crate::flow::SequentialFlow;
use crate::playbook::Playbook;
use crate::tasks::{Executable, TaskRegistry};

pub struct PlaybookEngine {
    registry: TaskRegistry,
    playbooks: HashMap<String, Playbook>,
    evaluator: Arc<dyn Evaluator>,
}

impl PlaybookEngine {
    /// An engine with the built-in tasks and the default expression engine
    pub fn new() -> Self {
        Self::with_registry(TaskRegistry::with_builtins())
    }

    pub fn with_registry(registry: TaskRegistry) -> Self {
        Self {
            registry,
            playbooks: HashMap::new(),
            evaluator: Arc::new(ExpressionEngine::new()),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Register a task; an id that is already taken keeps its original factory
    pub fn register<F, E>(&mut self, id: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: Executable + 'static,
    {
        self.registry.register(id, factory)
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Store a playbook under its id, returning any playbook it replaced
    pub fn add_playbook(&mut self, playbook: Playbook) -> Option<Playbook> {
        let replaced = self.playbooks.insert(playbook.id.clone(), playbook);
        if let Some(previous) = &replaced {
            warn!("Replacing playbook {}", previous.id);
        }
        replaced
    }

    pub fn add_playbooks(&mut self, playbooks: impl IntoIterator<Item = Playbook>) {
        for playbook in playbooks {
            self.add_playbook(playbook);
        }
    }

    pub fn playbook(&self, id: &str) -> Option<&Playbook> {
        self.playbooks.get(id)
    }

    /// Stored playbook ids, sorted
    pub fn playbook_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.playbooks.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn compile(&self, playbook: &Playbook) -> Result<SequentialFlow> {
        FlowCompiler::new(&self.registry).compile(playbook)
    }

    /// Compile and run a playbook, returning the report of its last attempted step.
    ///
    /// The caller's context, when given, is used as the run context: playbook
    /// vars are seeded into it without overwriting existing keys.
    #[instrument(skip(self, playbook, initial), fields(playbook = %playbook.id))]
    pub async fn run(&self, playbook: &Playbook, initial: Option<WorkContext>) -> Result<WorkReport> {
        let flow = self.compile(playbook)?;

        let work = match initial {
            Some(context) => context.using_evaluator(Arc::clone(&self.evaluator)),
            None => WorkContext::with_evaluator(Arc::clone(&self.evaluator)),
        };
        self.seed(playbook, &work).await;

        info!("Running playbook {}", playbook.label());
        let report = flow.run(&work).await?;
        info!(status = %report.status(), "Playbook {} finished", playbook.label());

        Ok(report)
    }

    pub async fn run_named(&self, id: &str, initial: Option<WorkContext>) -> Result<WorkReport> {
        let playbook = self
            .playbook(id)
            .ok_or_else(|| ExecutionError::PlaybookNotFound { id: id.to_string() })?;
        self.run(playbook, initial).await
    }

    /// Templated vars resolve against the context as the caller supplied it.
    /// A var that cannot be evaluated is logged and left out.
    async fn seed(&self, playbook: &Playbook, work: &WorkContext) {
        let initial = work.snapshot().await;

        for (name, value) in &playbook.vars {
            let value = match value {
                JsonValue::String(text) if text.contains("{{") && text.contains("}}") => {
                    match self.evaluator.evaluate(text, &initial) {
                        Ok(value) => value,
                        Err(e) => {
                            warn!("Skipping var {}, '{}' could not be evaluated: {}", name, text, e);
                            continue;
                        }
                    }
                }
                other => other.clone(),
            };
            work.put_absent(name.clone(), value).await;
        }
    }
}

impl Default for PlaybookEngine {
    fn default() -> Self {
        Self::new()
    }
}
