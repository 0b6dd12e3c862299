// ABOUTME: Task that checks a condition and reports it as its status
// ABOUTME: Used as a guard step at the head of a block

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Executable;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};

pub struct WhenTask;

#[async_trait]
impl Executable for WhenTask {
    async fn execute(&self, work: &WorkContext, task: &TaskContext) -> Result<WorkReport> {
        let Some(condition) = task.data() else {
            warn!("when task has no condition");
            return Ok(WorkReport::failed(work.clone(), "when task has no condition"));
        };

        match task.validate(work, condition).await {
            Ok(holds) => {
                debug!("Condition '{}' evaluated to {}", condition, holds);
                Ok(WorkReport::from_outcome(
                    work.clone(),
                    holds,
                    format!("condition not met: {}", condition),
                ))
            }
            Err(e) => {
                warn!("Condition '{}' could not be evaluated: {}", condition, e);
                Ok(WorkReport::failed(work.clone(), e.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "when"
    }
}
