// ABOUTME: Executables used by the flow unit tests
// ABOUTME: Record invocation order, sleep, fail or fault on demand

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::error::{ExecutionError, Result};
use crate::engine::{TaskContext, WorkContext, WorkReport};
use crate::tasks::Executable;

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Records its data into the journal, optionally after sleeping
pub struct Recorder {
    pub journal: Journal,
    pub sleep: Duration,
    pub fail: bool,
}

impl Recorder {
    pub fn unit(journal: &Journal, data: &str) -> TaskContext {
        Self::build(journal, data, Duration::ZERO, false)
    }

    pub fn failing(journal: &Journal, data: &str) -> TaskContext {
        Self::build(journal, data, Duration::ZERO, true)
    }

    pub fn sleeping(journal: &Journal, data: &str, sleep: Duration) -> TaskContext {
        Self::build(journal, data, sleep, false)
    }

    fn build(journal: &Journal, data: &str, sleep: Duration, fail: bool) -> TaskContext {
        let recorder = Recorder {
            journal: Arc::clone(journal),
            sleep,
            fail,
        };
        TaskContext::new(Arc::new(recorder)).with_data(data)
    }
}

#[async_trait]
impl Executable for Recorder {
    async fn execute(&self, work: &WorkContext, task: &TaskContext) -> Result<WorkReport> {
        if !self.sleep.is_zero() {
            tokio::time::sleep(self.sleep).await;
        }
        let data = task.data().unwrap_or_default().to_string();
        self.journal.lock().unwrap().push(data.clone());
        if self.fail {
            return Ok(WorkReport::failed(work.clone(), format!("{} failed", data)));
        }
        Ok(WorkReport::completed(work.clone()))
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

/// Returns an execution error instead of a report
pub struct Faulty;

#[async_trait]
impl Executable for Faulty {
    async fn execute(&self, _work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        Err(ExecutionError::TaskFailed {
            task: "faulty".to_string(),
            message: "broken".to_string(),
        })
    }

    fn name(&self) -> &str {
        "faulty"
    }
}

/// Panics when executed
pub struct Panicking;

#[async_trait]
impl Executable for Panicking {
    async fn execute(&self, _work: &WorkContext, _task: &TaskContext) -> Result<WorkReport> {
        panic!("executable blew up")
    }

    fn name(&self) -> &str {
        "panicking"
    }
}
