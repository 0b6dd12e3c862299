// ABOUTME: Task that assigns a value in the run's context
// ABOUTME: Parses `name = value`, evaluating the value when it is an expression

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::Executable;
use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};

pub struct SetTask;

/// Right-hand side of an assignment
#[derive(Debug, PartialEq)]
enum Assignment<'a> {
    Literal(JsonValue),
    Expression(&'a str),
}

fn parse_assignment(data: &str) -> Option<(&str, Assignment<'_>)> {
    let (property, value) = data.split_once('=')?;
    let property = property.trim();
    if property.is_empty() {
        return None;
    }

    let value = value.trim();
    let is_literal = value.chars().all(char::is_alphanumeric);
    let assignment = if is_literal {
        Assignment::Literal(literal_value(value))
    } else {
        Assignment::Expression(value)
    };
    Some((property, assignment))
}

fn literal_value(value: &str) -> JsonValue {
    match value {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        _ => value
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| JsonValue::String(value.to_string())),
    }
}

#[async_trait]
impl Executable for SetTask {
    async fn execute(&self, work: &WorkContext, task: &TaskContext) -> Result<WorkReport> {
        let Some(data) = task.data() else {
            return Ok(WorkReport::failed(work.clone(), "set task has no assignment"));
        };
        let Some((property, assignment)) = parse_assignment(data) else {
            warn!("Invalid assignment '{}', expected `name = value`", data);
            return Ok(WorkReport::failed(
                work.clone(),
                format!("invalid assignment: {}", data),
            ));
        };

        let value = match assignment {
            Assignment::Literal(value) => value,
            Assignment::Expression(expression) => match task.evaluate(work, expression).await {
                Ok(value) => value,
                Err(e) => {
                    warn!("Failed to evaluate '{}': {}", expression, e);
                    return Ok(WorkReport::failed(work.clone(), e.to_string()));
                }
            },
        };

        debug!("Setting field: {}={}", property, value);
        work.put(property, value).await;
        Ok(WorkReport::completed(work.clone()))
    }

    fn name(&self) -> &str {
        "set"
    }
}
