// ABOUTME: Task that writes a message to the log
// ABOUTME: Message comes from the task data, the `message` var, or the `log-message` work var

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::Executable;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};

pub const MESSAGE_VAR: &str = "message";
pub const GLOBAL_MESSAGE_VAR: &str = "log-message";

pub struct LogTask;

impl LogTask {
    async fn find_message(work: &WorkContext, task: &TaskContext) -> Option<String> {
        if let Some(data) = task.data() {
            return Some(data.to_string());
        }
        if let Some(message) = task.var_string(MESSAGE_VAR) {
            return Some(message);
        }
        work.get_string(GLOBAL_MESSAGE_VAR).await
    }
}

#[async_trait]
impl Executable for LogTask {
    async fn execute(&self, work: &WorkContext, task: &TaskContext) -> Result<WorkReport> {
        let Some(message) = Self::find_message(work, task).await else {
            warn!("A message was not found");
            return Ok(WorkReport::failed(work.clone(), "no message to log"));
        };

        let message = if message.contains("{{") && message.contains("}}") {
            match task.evaluate(work, &message).await {
                Ok(JsonValue::String(rendered)) => rendered,
                Ok(JsonValue::Null) => String::new(),
                Ok(other) => other.to_string(),
                Err(e) => {
                    warn!("Failed to render log message '{}': {}", message, e);
                    return Ok(WorkReport::failed(work.clone(), e.to_string()));
                }
            }
        } else {
            message
        };

        info!(task = task.label(), "{}", message);
        Ok(WorkReport::completed(work.clone()))
    }

    fn name(&self) -> &str {
        "log"
    }
}
