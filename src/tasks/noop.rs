// ABOUTME: Task that does nothing and always completes
// ABOUTME: Placeholder step for playbooks and tests

use async_trait::async_trait;

use super::Executable;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};

pub struct NoopTask;

#[async_trait]
impl Executable for NoopTask {
    async fn execute(&self, work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        Ok(WorkReport::completed(work.clone()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}
