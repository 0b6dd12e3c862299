// ABOUTME: Static task tree describing a playbook
// ABOUTME: Defines Playbook and Task with defaults and builder helpers

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::expression::Vars;

pub const BLOCK: &str = "block";
pub const PARALLEL: &str = "parallel";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_THREADS: usize = 2;

/// Ordered list of tasks; order is execution order
pub type TaskList = Vec<Task>;

#[derive(Debug, Clone, PartialEq)]
pub struct Playbook {
    pub id: String,
    pub name: Option<String>,
    pub vars: IndexMap<String, JsonValue>,
    pub tasks: TaskList,
}

/// One declared step: a leaf unit of work or a `block`/`parallel` container
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: Option<String>,
    pub data: Option<String>,
    pub vars: IndexMap<String, JsonValue>,
    pub when: Option<String>,
    /// Milliseconds to wait before each execution
    pub delay: u64,
    pub repeat: u64,
    /// Seconds allowed per parallel branch; 0 means unlimited
    pub timeout: u64,
    pub threads: usize,
    pub tasks: TaskList,
}

impl Playbook {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            vars: IndexMap::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Display label: the name when set, else the id
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Every task id referenced in the tree, depth first
    pub fn task_ids(&self) -> Vec<&str> {
        fn collect<'a>(tasks: &'a [Task], ids: &mut Vec<&'a str>) {
            for task in tasks {
                ids.push(&task.id);
                collect(&task.tasks, ids);
            }
        }
        let mut ids = Vec::new();
        collect(&self.tasks, &mut ids);
        ids
    }
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            data: None,
            vars: IndexMap::new(),
            when: None,
            delay: 0,
            repeat: 0,
            timeout: DEFAULT_TIMEOUT_SECS,
            threads: DEFAULT_THREADS,
            tasks: Vec::new(),
        }
    }

    /// A leaf task with its primary argument
    pub fn with_data_for(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(id).with_data(data)
    }

    pub fn block(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self::new(BLOCK).with_tasks(tasks)
    }

    pub fn parallel(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self::new(PARALLEL).with_tasks(tasks)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
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

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = delay_ms;
        self
    }

    pub fn with_repeat(mut self, repeat: u64) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = timeout_secs;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn is_block(&self) -> bool {
        self.id == BLOCK
    }

    pub fn is_parallel(&self) -> bool {
        self.id == PARALLEL
    }

    /// Only containers may own child tasks
    pub fn is_container(&self) -> bool {
        self.is_block() || self.is_parallel()
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Task vars as an expression variable map
    pub fn vars_map(&self) -> Vars {
        self.vars
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
