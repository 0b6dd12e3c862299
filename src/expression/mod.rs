// ABOUTME: Expression evaluation for guards, computed values and templated vars
// ABOUTME: Exposes the Evaluator trait with a minijinja-backed default engine

pub mod engine;
pub mod error;
pub mod functions;

pub use engine::{Evaluator, ExpressionEngine, Vars};
pub use error::{ExpressionError, Result};
