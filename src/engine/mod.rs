// ABOUTME: Playbook execution engine: run context, reports, compiler and entry point
// ABOUTME: Compiles task trees into flows and runs them against a shared WorkContext

pub mod compiler;
pub mod context;
pub mod error;
pub mod report;
pub mod runner;

pub use compiler::FlowCompiler;
pub use context::{TaskContext, WorkContext};
pub use error::{ExecutionError, Result};
pub use report::{ParallelFlowReport, UnitReport, WorkReport, WorkStatus};
pub use runner::PlaybookEngine;
