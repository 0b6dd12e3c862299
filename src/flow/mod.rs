// ABOUTME: Flow primitives that compose executable units into control flow
// ABOUTME: Sequential, parallel, repeating and conditional flows all implement Executable

pub mod conditional;
pub mod parallel;
pub mod predicate;
pub mod repeat;
pub mod sequential;

pub use conditional::ConditionalFlow;
pub use parallel::{ParallelFlow, ParallelFlowExecutor, WorkerPool};
pub use predicate::ReportPredicate;
pub use repeat::{RepeatFlow, RepeatMode};
pub use sequential::{SequenceScope, SequentialFlow};

#[cfg(test)]
pub(crate) mod test_support;
