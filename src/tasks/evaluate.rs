// ABOUTME: Task that evaluates an expression against the run's context
// ABOUTME: Optionally stores the result under the key named by the `result` var

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Executable;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};

pub const RESULT_VAR: &str = "result";

pub struct EvaluateTask;

#[async_trait]
impl Executable for EvaluateTask {
    async fn execute(&self, work: &WorkContext, task: &TaskContext) -> Result<WorkReport> {
        let Some(expression) = task.data() else {
            return Ok(WorkReport::failed(work.clone(), "evaluate task has no expression"));
        };

        let value = match task.evaluate(work, expression).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to evaluate '{}': {}", expression, e);
                return Ok(WorkReport::failed(work.clone(), e.to_string()));
            }
        };

        debug!("Evaluated '{}' to {}", expression, value);
        if let Some(key) = task.var_string(RESULT_VAR) {
            work.put(key, value).await;
        }

        Ok(WorkReport::completed(work.clone()))
    }

    fn name(&self) -> &str {
        "evaluate"
    }
}
