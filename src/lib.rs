// ABOUTME: Main library module for the flowbook playbook engine
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod expression;
pub mod flow;
pub mod playbook;
pub mod tasks;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{
    ExecutionError, ParallelFlowReport, PlaybookEngine, TaskContext, WorkContext, WorkReport,
    WorkStatus,
};
pub use expression::{Evaluator, ExpressionEngine};
pub use playbook::{Playbook, PlaybookParser, Task};
pub use tasks::{Executable, TaskRegistry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
