// ABOUTME: Parallel flow fanning units out onto a bounded, single-use worker pool
// ABOUTME: Applies per-branch timeouts and keeps reports in submission order

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::engine::error::{ExecutionError, Result};
use crate::engine::{ParallelFlowReport, TaskContext, WorkContext, WorkReport};
use crate::tasks::Executable;

/// Bounded set of execution slots. Closed after one batch.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    threads: usize,
}

impl WorkerPool {
    /// A pool with `threads` slots, clamped to what a semaphore can hold
    pub fn new(threads: usize) -> Self {
        let threads = threads.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(threads)),
            threads,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_shutdown(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn shutdown(&self) {
        debug!("Shutting down worker pool");
        self.semaphore.close();
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ExecutionError::PoolShutdown)
    }
}

/// Runs a batch of units on a worker pool, each bounded by its own timeout
#[derive(Debug, Clone)]
pub struct ParallelFlowExecutor {
    pool: WorkerPool,
    timeout: Option<Duration>,
}

impl ParallelFlowExecutor {
    /// A zero timeout disables the per-branch limit
    pub fn new(pool: WorkerPool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout: (!timeout.is_zero()).then_some(timeout),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Execute every unit and return one report per unit, in input order.
    ///
    /// A timed out branch yields a FAILED report. Any other branch fault
    /// aborts the remaining branches and is returned as an error.
    pub async fn execute_in_parallel(
        &self,
        units: &[TaskContext],
        work: &WorkContext,
    ) -> Result<Vec<WorkReport>> {
        if self.pool.is_shutdown() {
            return Err(ExecutionError::PoolShutdown);
        }

        debug!(
            "Executing {} branches on {} workers, timeout {:?}",
            units.len(),
            self.pool.threads(),
            self.timeout
        );

        // Dropping the set aborts every branch, and with it any flows nested inside
        let mut branches = JoinSet::new();
        for (index, unit) in units.iter().cloned().enumerate() {
            let pool = self.pool.clone();
            let work = work.clone();
            let limit = self.timeout;
            branches.spawn(async move {
                let outcome = match AssertUnwindSafe(run_branch(index, unit, pool, work, limit))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(panic) => Err(panic_message(panic.as_ref())),
                };
                (index, outcome)
            });
        }

        let mut reports: Vec<Option<WorkReport>> = vec![None; units.len()];
        while let Some(joined) = branches.join_next().await {
            let (index, message) = match joined {
                Ok((index, Ok(report))) => {
                    reports[index] = Some(report);
                    continue;
                }
                Ok((index, Err(message))) => (index, message),
                Err(join_error) => (first_pending(&reports), join_error.to_string()),
            };

            error!("Parallel branch {} faulted: {}", index, message);
            branches.abort_all();
            self.pool.shutdown();
            return Err(ExecutionError::BranchFault {
                branch: index,
                message,
            });
        }

        self.pool.shutdown();
        reports
            .into_iter()
            .enumerate()
            .map(|(branch, report)| {
                report.ok_or_else(|| ExecutionError::BranchFault {
                    branch,
                    message: "branch produced no report".to_string(),
                })
            })
            .collect()
    }
}

fn first_pending(reports: &[Option<WorkReport>]) -> usize {
    reports.iter().position(Option::is_none).unwrap_or_default()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("branch panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("branch panicked: {}", message)
    } else {
        "branch panicked".to_string()
    }
}

async fn run_branch(
    index: usize,
    unit: TaskContext,
    pool: WorkerPool,
    work: WorkContext,
    limit: Option<Duration>,
) -> Result<WorkReport> {
    let _permit = pool.acquire().await?;

    if !unit.guard_passes(&work).await? {
        warn!(
            "Skipping branch {} ({}), condition not met: {}",
            index,
            unit.label(),
            unit.when().unwrap_or_default()
        );
        return Ok(WorkReport::completed(work));
    }

    let Some(limit) = limit else {
        return unit.execute(&work).await;
    };

    match timeout(limit, unit.execute(&work)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Branch {} ({}) timed out after {:?}",
                index,
                unit.label(),
                limit
            );
            Ok(WorkReport::failed(
                work,
                format!("{} timed out after {:?}", unit.label(), limit),
            ))
        }
    }
}

pub struct ParallelFlow {
    name: String,
    units: Vec<TaskContext>,
    executor: ParallelFlowExecutor,
}

impl ParallelFlow {
    pub fn new(name: impl Into<String>, units: Vec<TaskContext>, executor: ParallelFlowExecutor) -> Self {
        Self {
            name: name.into(),
            units,
            executor,
        }
    }

    pub fn units(&self) -> &[TaskContext] {
        &self.units
    }

    pub fn executor(&self) -> &ParallelFlowExecutor {
        &self.executor
    }

    pub async fn run(&self, work: &WorkContext) -> Result<ParallelFlowReport> {
        let reports = self.executor.execute_in_parallel(&self.units, work).await?;
        let report = ParallelFlowReport::new(work.clone(), reports);
        info!(
            "{} finished: {} of {} branches completed",
            self.name,
            report.len() - report.failed_reports().count(),
            report.len()
        );
        Ok(report)
    }
}

#[async_trait]
impl Executable for ParallelFlow {
    async fn execute(&self, work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        Ok(self.run(work).await?.into())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
