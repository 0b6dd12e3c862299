// ABOUTME: Repeat flow executing one unit several times
// ABOUTME: Iterates a fixed number of times or while a report predicate holds

use async_trait::async_trait;
use tracing::{debug, warn};

use super::predicate::ReportPredicate;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};
use crate::tasks::Executable;

#[derive(Debug, Clone)]
pub enum RepeatMode {
    /// Exactly this many iterations, whatever each one reports
    Times(usize),
    /// Keep going while the predicate holds for the last report
    While(ReportPredicate),
}

/// Runs its unit at least once. The unit's `when` guard is checked once,
/// before the first iteration.
pub struct RepeatFlow {
    name: String,
    unit: TaskContext,
    mode: RepeatMode,
}

impl RepeatFlow {
    pub fn times(unit: TaskContext, times: usize) -> Self {
        Self::new(unit, RepeatMode::Times(times))
    }

    pub fn repeat_while(unit: TaskContext, predicate: ReportPredicate) -> Self {
        Self::new(unit, RepeatMode::While(predicate))
    }

    fn new(unit: TaskContext, mode: RepeatMode) -> Self {
        Self {
            name: "repeat".to_string(),
            unit,
            mode,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn mode(&self) -> &RepeatMode {
        &self.mode
    }

    pub async fn run(&self, work: &WorkContext) -> Result<WorkReport> {
        if !self.unit.guard_passes(work).await? {
            let when = self.unit.when().unwrap_or_default();
            warn!("Not repeating {}, condition not met: {}", self.unit.label(), when);
            return Ok(WorkReport::failed(
                work.clone(),
                format!("condition not met: {}", when),
            ));
        }

        let mut iterations = 0usize;
        loop {
            let report = self.unit.execute(work).await?;
            iterations += 1;

            let again = match &self.mode {
                RepeatMode::Times(times) => iterations < *times,
                RepeatMode::While(predicate) => predicate.apply(&report),
            };
            if !again {
                debug!("{} ran {} times", self.unit.label(), iterations);
                return Ok(report);
            }
        }
    }
}

#[async_trait]
impl Executable for RepeatFlow {
    async fn execute(&self, work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        self.run(work).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
