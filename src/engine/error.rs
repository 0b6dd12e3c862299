// ABOUTME: Error types for compiling and running playbooks
// ABOUTME: Separates compile-time rejections from faults raised while flows execute

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Playbook '{playbook}' has no tasks")]
    EmptyPlaybook { playbook: String },

    #[error("Task '{task}' at {path} requires a non-empty task list")]
    EmptyTaskList { task: String, path: String },

    #[error("Task '{task}' at {path} cannot have nested tasks")]
    UnexpectedChildren { task: String, path: String },

    #[error("No task registered for id '{task}' at {path}")]
    UnresolvedTask { task: String, path: String },

    #[error("Playbook not found: {id}")]
    PlaybookNotFound { id: String },

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("Parallel branch {branch} faulted: {message}")]
    BranchFault { branch: usize, message: String },

    #[error("Worker pool has been shut down")]
    PoolShutdown,

    #[error("Expression error: {0}")]
    Expression(#[from] crate::expression::ExpressionError),

    #[error("Parser error: {0}")]
    Parser(#[from] crate::playbook::ParserError),
}

impl ExecutionError {
    /// True for the errors raised before anything executes
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            ExecutionError::EmptyPlaybook { .. }
                | ExecutionError::EmptyTaskList { .. }
                | ExecutionError::UnexpectedChildren { .. }
                | ExecutionError::UnresolvedTask { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
