// ABOUTME: Compiler turning a playbook's task tree into a tree of flows
// ABOUTME: Resolves task ids through the registry and rejects malformed trees before anything runs

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::context::TaskContext;
use super::error::{ExecutionError, Result};
use crate::flow::{
    ParallelFlow, ParallelFlowExecutor, RepeatFlow, SequenceScope, SequentialFlow, WorkerPool,
};
use crate::playbook::{Playbook, Task};
use crate::tasks::{Executable, TaskRegistry};

/// Compiles playbooks against a task registry.
///
/// Compilation is all or nothing: the first malformed node or unknown task
/// id anywhere in the tree fails the whole playbook. Each compile builds
/// fresh worker pools, so a compiled flow is good for a single run.
pub struct FlowCompiler<'a> {
    registry: &'a TaskRegistry,
}

impl<'a> FlowCompiler<'a> {
    pub fn new(registry: &'a TaskRegistry) -> Self {
        Self { registry }
    }

    pub fn compile(&self, playbook: &Playbook) -> Result<SequentialFlow> {
        if playbook.is_empty() {
            return Err(ExecutionError::EmptyPlaybook {
                playbook: playbook.id.clone(),
            });
        }

        let steps = self.compile_list(&playbook.tasks, &playbook.id)?;
        debug!("Compiled playbook {} into {} steps", playbook.id, steps.len());
        Ok(SequentialFlow::new(playbook.id.clone(), SequenceScope::Playbook).then_all(steps))
    }

    fn compile_list(&self, tasks: &[Task], path: &str) -> Result<Vec<TaskContext>> {
        tasks
            .iter()
            .enumerate()
            .map(|(index, task)| self.compile_task(task, &format!("{}[{}]", path, index)))
            .collect()
    }

    fn compile_task(&self, task: &Task, path: &str) -> Result<TaskContext> {
        if task.is_block() {
            let children = self.compile_children(task, path)?;
            let flow = SequentialFlow::block().then_all(children);
            return Ok(bind(task, Arc::new(flow)));
        }

        if task.is_parallel() {
            let children = self.compile_children(task, path)?;
            let executor = ParallelFlowExecutor::new(
                WorkerPool::new(task.threads),
                Duration::from_secs(task.timeout),
            );
            let flow = ParallelFlow::new(task.label(), children, executor);
            return Ok(bind(task, Arc::new(flow)));
        }

        if !task.tasks.is_empty() {
            return Err(ExecutionError::UnexpectedChildren {
                task: task.id.clone(),
                path: path.to_string(),
            });
        }

        let executable =
            self.registry
                .resolve(&task.id)
                .ok_or_else(|| ExecutionError::UnresolvedTask {
                    task: task.id.clone(),
                    path: path.to_string(),
                })?;
        let unit = bind(task, executable);

        if task.repeat == 0 {
            return Ok(unit);
        }

        // The repeat flow owns the guard and checks it once
        let flow = RepeatFlow::times(unit, task.repeat as usize).named(task.label());
        Ok(TaskContext::new(Arc::new(flow)).named(task.label()))
    }

    fn compile_children(&self, task: &Task, path: &str) -> Result<Vec<TaskContext>> {
        if task.tasks.is_empty() {
            return Err(ExecutionError::EmptyTaskList {
                task: task.id.clone(),
                path: path.to_string(),
            });
        }
        self.compile_list(&task.tasks, &format!("{}.{}", path, task.id))
    }
}

fn bind(task: &Task, executable: Arc<dyn Executable>) -> TaskContext {
    let mut context = TaskContext::new(executable)
        .with_vars(task.vars_map())
        .with_delay(Duration::from_millis(task.delay));
    if let Some(name) = &task.name {
        context = context.named(name.clone());
    }
    if let Some(data) = &task.data {
        context = context.with_data(data.clone());
    }
    if let Some(when) = &task.when {
        context = context.with_when(when.clone());
    }
    context
}
