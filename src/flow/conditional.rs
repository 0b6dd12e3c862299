// ABOUTME: Conditional flow choosing a branch from the outcome of an initial unit
// ABOUTME: Runs the success branch when the predicate holds, else the optional fallback

use async_trait::async_trait;
use tracing::debug;

use super::predicate::ReportPredicate;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};
use crate::tasks::Executable;

pub struct ConditionalFlow {
    name: String,
    initial: TaskContext,
    predicate: ReportPredicate,
    then: TaskContext,
    otherwise: Option<TaskContext>,
}

impl ConditionalFlow {
    pub fn new(initial: TaskContext, predicate: ReportPredicate, then: TaskContext) -> Self {
        Self {
            name: "conditional".to_string(),
            initial,
            predicate,
            then,
            otherwise: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn otherwise(mut self, unit: TaskContext) -> Self {
        self.otherwise = Some(unit);
        self
    }

    pub async fn run(&self, work: &WorkContext) -> Result<WorkReport> {
        let report = self.initial.execute(work).await?;

        if self.predicate.apply(&report) {
            debug!("{}: predicate held, running {}", self.name, self.then.label());
            return self.then.execute(work).await;
        }

        match &self.otherwise {
            Some(unit) => {
                debug!("{}: predicate failed, running {}", self.name, unit.label());
                unit.execute(work).await
            }
            None => Ok(report),
        }
    }
}

#[async_trait]
impl Executable for ConditionalFlow {
    async fn execute(&self, work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        self.run(work).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
