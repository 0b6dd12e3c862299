// ABOUTME: Run-scoped shared state and per-task execution bindings
// ABOUTME: WorkContext is shared across flows and branches, TaskContext binds one executable

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::Result;
use super::report::WorkReport;
use crate::expression::{self, Evaluator, ExpressionEngine, Vars};
use crate::tasks::Executable;

/// Key/value store shared by every unit of one run.
///
/// Cloning is cheap and yields a handle to the same store, so parallel
/// branches can read and write without any locking of their own.
#[derive(Clone)]
pub struct WorkContext {
    values: Arc<RwLock<HashMap<String, JsonValue>>>,
    evaluator: Arc<dyn Evaluator>,
}

impl WorkContext {
    pub fn new() -> Self {
        Self::with_evaluator(Arc::new(ExpressionEngine::new()))
    }

    pub fn with_evaluator(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            evaluator,
        }
    }

    /// Create a context pre-populated with `vars`
    pub fn from_vars(vars: Vars) -> Self {
        let context = Self::new();
        let values = vars
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        Self {
            values: Arc::new(RwLock::new(values)),
            ..context
        }
    }

    /// Same store, different evaluator
    pub fn using_evaluator(&self, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            values: Arc::clone(&self.values),
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub async fn get(&self, key: &str) -> Option<JsonValue> {
        let values = self.values.read().await;
        values.get(key).cloned()
    }

    /// String form of a value; non-string scalars are formatted
    pub async fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).await.map(|value| match value {
            JsonValue::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Store a value, returning the previous one. Null values are ignored.
    pub async fn put(&self, key: impl Into<String>, value: impl Into<JsonValue>) -> Option<JsonValue> {
        let value = value.into();
        if value.is_null() {
            return None;
        }
        let mut values = self.values.write().await;
        values.insert(key.into(), value)
    }

    /// Store a value only when the key is absent; returns whether it was stored
    pub async fn put_absent(&self, key: impl Into<String>, value: impl Into<JsonValue>) -> bool {
        let value = value.into();
        if value.is_null() {
            return false;
        }
        let mut values = self.values.write().await;
        match values.entry(key.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Insert every entry whose key is not already present
    pub async fn seed(&self, vars: Vars) {
        let mut values = self.values.write().await;
        for (key, value) in vars {
            if value.is_null() {
                continue;
            }
            values.entry(key).or_insert(value);
        }
    }

    pub async fn remove(&self, key: &str) -> Option<JsonValue> {
        let mut values = self.values.write().await;
        values.remove(key)
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        let values = self.values.read().await;
        values.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> Vars {
        let values = self.values.read().await;
        values
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Evaluate against the current contents, with `overrides` taking precedence
    pub async fn evaluate(&self, expression: &str, overrides: &Vars) -> expression::Result<JsonValue> {
        let vars = self.merged(overrides).await;
        self.evaluator.evaluate(expression, &vars)
    }

    pub async fn validate(&self, expression: &str, overrides: &Vars) -> expression::Result<bool> {
        let vars = self.merged(overrides).await;
        self.evaluator.validate(expression, &vars)
    }

    async fn merged(&self, overrides: &Vars) -> Vars {
        let mut vars = self.snapshot().await;
        for (key, value) in overrides {
            vars.insert(key.clone(), value.clone());
        }
        vars
    }
}

impl Default for WorkContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WorkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.values.try_read() {
            Ok(values) => f.debug_struct("WorkContext").field("values", &*values).finish(),
            Err(_) => f.debug_struct("WorkContext").finish_non_exhaustive(),
        }
    }
}

/// Binding of one executable to the arguments of a single task node.
///
/// Built fresh per node at compile time. Parallel branches each own a clone.
#[derive(Clone)]
pub struct TaskContext {
    executable: Arc<dyn Executable>,
    label: Option<String>,
    data: Option<String>,
    vars: Vars,
    when: Option<String>,
    delay: Duration,
}

impl TaskContext {
    pub fn new(executable: Arc<dyn Executable>) -> Self {
        Self {
            executable,
            label: None,
            data: None,
            vars: Vars::new(),
            when: None,
            delay: Duration::ZERO,
        }
    }

    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_vars(mut self, vars: Vars) -> Self {
        self.vars.extend(vars);
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn executable(&self) -> &Arc<dyn Executable> {
        &self.executable
    }

    /// Label used in logs: the task name when given, else the executable's name
    pub fn label(&self) -> &str {
        self.label
            .as_deref()
            .unwrap_or_else(|| self.executable.name())
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn var(&self, key: &str) -> Option<&JsonValue> {
        self.vars.get(key)
    }

    /// A task var as a string; non-string scalars are formatted
    pub fn var_string(&self, key: &str) -> Option<String> {
        self.vars.get(key).and_then(|value| match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    pub fn when(&self) -> Option<&str> {
        self.when.as_deref()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Evaluate the `when` guard; an absent guard always passes
    pub async fn guard_passes(&self, work: &WorkContext) -> Result<bool> {
        match self.when() {
            None => Ok(true),
            Some(when) => Ok(work.validate(when, &self.vars).await?),
        }
    }

    pub async fn evaluate(&self, work: &WorkContext, expression: &str) -> expression::Result<JsonValue> {
        work.evaluate(expression, &self.vars).await
    }

    pub async fn validate(&self, work: &WorkContext, expression: &str) -> expression::Result<bool> {
        work.validate(expression, &self.vars).await
    }

    /// Wait out the delay, then run the bound executable
    pub async fn execute(&self, work: &WorkContext) -> Result<WorkReport> {
        if !self.delay.is_zero() {
            debug!("Delaying {} by {:?}", self.label(), self.delay);
            tokio::time::sleep(self.delay).await;
        }
        debug!("Executing {}", self.label());
        self.executable.execute(work, self).await
    }

    /// Whether a FAILED report from this unit stays contained within it
    pub fn isolates_failure(&self) -> bool {
        self.executable.isolates_failure()
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("executable", &self.executable.name())
            .field("data", &self.data)
            .field("vars", &self.vars)
            .field("when", &self.when)
            .field("delay", &self.delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::NoopTask;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_ignores_null() {
        let context = WorkContext::new();

        assert!(context.put("a", json!(null)).await.is_none());
        assert!(!context.contains_key("a").await);

        context.put("a", 1).await;
        assert_eq!(context.get("a").await, Some(json!(1)));
        assert_eq!(context.put("a", 2).await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_keys() {
        let context = WorkContext::new();
        context.put("name", "caller").await;

        let mut vars = Vars::new();
        vars.insert("name".to_string(), json!("playbook"));
        vars.insert("count".to_string(), json!(3));
        context.seed(vars).await;

        assert_eq!(context.get_string("name").await.as_deref(), Some("caller"));
        assert_eq!(context.get_string("count").await.as_deref(), Some("3"));
        assert!(!context.put_absent("count", 4).await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let context = WorkContext::new();
        let other = context.clone();

        other.put("shared", true).await;
        assert_eq!(context.get("shared").await, Some(json!(true)));
        assert_eq!(context.len().await, 1);
    }

    #[tokio::test]
    async fn test_task_vars_override_work_vars() {
        let context = WorkContext::new();
        context.put("level", 1).await;

        let task = TaskContext::new(Arc::new(NoopTask)).with_var("level", 5);

        assert_eq!(task.evaluate(&context, "level * 2").await.unwrap(), json!(10));
        assert!(context.validate("level == 1", &Vars::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_guard_passes() {
        let context = WorkContext::new();
        context.put("ready", false).await;

        let unguarded = TaskContext::new(Arc::new(NoopTask));
        let guarded = TaskContext::new(Arc::new(NoopTask)).with_when("ready");

        assert!(unguarded.guard_passes(&context).await.unwrap());
        assert!(!guarded.guard_passes(&context).await.unwrap());

        context.put("ready", true).await;
        assert!(guarded.guard_passes(&context).await.unwrap());
    }

    #[tokio::test]
    async fn test_label_falls_back_to_executable_name() {
        let task = TaskContext::new(Arc::new(NoopTask));
        assert_eq!(task.label(), "noop");
        assert_eq!(task.named("do nothing").label(), "do nothing");
    }
}
