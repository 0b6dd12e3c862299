// ABOUTME: Executable units of work and the registry that resolves task ids to them
// ABOUTME: Contains the built-in log, set, when, evaluate and noop tasks

pub mod evaluate;
pub mod log;
pub mod noop;
pub mod set;
pub mod when;

pub use evaluate::EvaluateTask;
pub use log::LogTask;
pub use noop::NoopTask;
pub use set::SetTask;
pub use when::WhenTask;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::engine::error::Result;
use crate::engine::{TaskContext, WorkContext, WorkReport};

/// A unit of work bound to a task id. Flows implement it too, so they nest.
#[async_trait]
pub trait Executable: Send + Sync {
    async fn execute(&self, work: &WorkContext, task: &TaskContext) -> Result<WorkReport>;

    fn name(&self) -> &str;

    /// When true, a FAILED report from this unit does not abort the enclosing sequence
    fn isolates_failure(&self) -> bool {
        false
    }
}

pub type TaskFactory = Arc<dyn Fn() -> Arc<dyn Executable> + Send + Sync>;

/// Maps task ids to factories producing their executables
#[derive(Clone, Default)]
pub struct TaskRegistry {
    factories: HashMap<String, TaskFactory>,
}

impl TaskRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in tasks
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Add the built-in tasks; ids already registered keep their factory
    pub fn register_builtins(&mut self) {
        self.register("log", || LogTask);
        self.register("set", || SetTask);
        self.register("when", || WhenTask);
        self.register("evaluate", || EvaluateTask);
        self.register("noop", || NoopTask);
    }

    /// Register a factory for `id`. Returns false, changing nothing, when the id is taken.
    pub fn register<F, E>(&mut self, id: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: Executable + 'static,
    {
        let id = id.into();
        if self.factories.contains_key(&id) {
            debug!("Task id '{}' already registered, ignoring", id);
            return false;
        }
        let factory: TaskFactory = Arc::new(move || Arc::new(factory()) as Arc<dyn Executable>);
        self.factories.insert(id, factory);
        true
    }

    /// Instantiate the executable registered for `id`
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Executable>> {
        self.factories.get(id).map(|factory| factory())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTask;

    #[async_trait]
    impl Executable for FailingTask {
        async fn execute(&self, work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
            Ok(WorkReport::failed(work.clone(), "always fails"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TaskRegistry::with_builtins();
        assert_eq!(registry.list(), vec!["evaluate", "log", "noop", "set", "when"]);
        assert!(registry.resolve("block").is_none());
    }

    #[tokio::test]
    async fn test_reregistration_is_a_no_op() {
        let mut registry = TaskRegistry::new();
        assert!(registry.register("log", || FailingTask));
        registry.register_builtins();
        assert!(!registry.register("log", || NoopTask));

        let executable = registry.resolve("log").unwrap();
        assert_eq!(executable.name(), "failing");

        let work = WorkContext::new();
        let task = TaskContext::new(Arc::clone(&executable));
        let report = task.execute(&work).await.unwrap();
        assert!(report.is_failed());
    }
}
