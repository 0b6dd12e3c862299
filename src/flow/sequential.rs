// ABOUTME: Sequential flow running its steps one after another
// ABOUTME: Handles `when` skipping, block-scoped aborts and failure short-circuiting

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};
use crate::tasks::Executable;

/// Where a sequence sits in the playbook tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceScope {
    /// Top level: a false guard skips only its own step
    Playbook,
    /// Nested block: a false guard ends the block, and failures stay inside it
    Block,
}

pub struct SequentialFlow {
    name: String,
    scope: SequenceScope,
    steps: Vec<TaskContext>,
}

impl SequentialFlow {
    pub fn new(name: impl Into<String>, scope: SequenceScope) -> Self {
        Self {
            name: name.into(),
            scope,
            steps: Vec::new(),
        }
    }

    /// A block-scoped sequence named "block"
    pub fn block() -> Self {
        Self::new("block", SequenceScope::Block)
    }

    pub fn then(mut self, step: TaskContext) -> Self {
        self.steps.push(step);
        self
    }

    pub fn then_all(mut self, steps: impl IntoIterator<Item = TaskContext>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn scope(&self) -> SequenceScope {
        self.scope
    }

    pub fn steps(&self) -> &[TaskContext] {
        &self.steps
    }

    /// Run every step in order and return the last report produced.
    ///
    /// With no report at all (every step skipped) the sequence completes.
    pub async fn run(&self, work: &WorkContext) -> Result<WorkReport> {
        let mut last_report = None;

        for step in &self.steps {
            if !step.guard_passes(work).await? {
                let when = step.when().unwrap_or_default();
                if self.scope == SequenceScope::Block {
                    warn!(
                        "Ending {}, condition not met for {}: {}",
                        self.name,
                        step.label(),
                        when
                    );
                    break;
                }
                warn!("Skipping {}, condition not met: {}", step.label(), when);
                continue;
            }

            let report = step.execute(work).await?;
            if report.is_failed() && !step.isolates_failure() {
                warn!(
                    "Work unit '{}' has failed, skipping subsequent work units in {}",
                    step.label(),
                    self.name
                );
                return Ok(report);
            }
            debug!("{} finished with {}", step.label(), report.status());
            last_report = Some(report);
        }

        Ok(last_report.unwrap_or_else(|| WorkReport::completed(work.clone())))
    }
}

#[async_trait]
impl Executable for SequentialFlow {
    async fn execute(&self, work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        self.run(work).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn isolates_failure(&self) -> bool {
        self.scope == SequenceScope::Block
    }
}
