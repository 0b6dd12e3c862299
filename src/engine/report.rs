// ABOUTME: Outcome types returned by every executable unit and flow
// ABOUTME: Defines WorkStatus, WorkReport and the per-branch ParallelFlowReport aggregate

use serde::{Deserialize, Serialize};

use super::context::WorkContext;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkStatus {
    Completed,
    Failed,
}

/// Report produced by a single unit of work
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub status: WorkStatus,
    pub context: WorkContext,
    pub error: Option<String>,
}

/// Bag of branch reports in submission order.
///
/// No status is stored: every accessor scans the branches, so a report
/// assembled from partial results can never disagree with its members.
#[derive(Debug, Clone)]
pub struct ParallelFlowReport {
    reports: Vec<WorkReport>,
    context: WorkContext,
}

#[derive(Debug, Clone)]
pub enum WorkReport {
    Unit(UnitReport),
    Parallel(ParallelFlowReport),
}

impl WorkReport {
    pub fn completed(context: WorkContext) -> Self {
        WorkReport::Unit(UnitReport {
            status: WorkStatus::Completed,
            context,
            error: None,
        })
    }

    pub fn failed(context: WorkContext, error: impl Into<String>) -> Self {
        WorkReport::Unit(UnitReport {
            status: WorkStatus::Failed,
            context,
            error: Some(error.into()),
        })
    }

    /// Map a boolean outcome onto a report
    pub fn from_outcome(context: WorkContext, succeeded: bool, error: impl Into<String>) -> Self {
        if succeeded {
            Self::completed(context)
        } else {
            Self::failed(context, error)
        }
    }

    pub fn status(&self) -> WorkStatus {
        match self {
            WorkReport::Unit(report) => report.status,
            WorkReport::Parallel(report) => report.status(),
        }
    }

    pub fn context(&self) -> &WorkContext {
        match self {
            WorkReport::Unit(report) => &report.context,
            WorkReport::Parallel(report) => &report.context,
        }
    }

    /// The error message of a failed unit, or of the first failed branch
    pub fn error(&self) -> Option<&str> {
        match self {
            WorkReport::Unit(report) => report.error.as_deref(),
            WorkReport::Parallel(report) => report.failed_reports().find_map(|r| r.error()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status() == WorkStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status() == WorkStatus::Failed
    }

    pub fn as_parallel(&self) -> Option<&ParallelFlowReport> {
        match self {
            WorkReport::Parallel(report) => Some(report),
            WorkReport::Unit(_) => None,
        }
    }
}

impl ParallelFlowReport {
    pub fn new(context: WorkContext, reports: Vec<WorkReport>) -> Self {
        Self { reports, context }
    }

    pub fn reports(&self) -> &[WorkReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn failed_reports(&self) -> impl Iterator<Item = &WorkReport> {
        self.reports.iter().filter(|r| r.is_failed())
    }

    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(|r| r.is_completed())
    }

    /// FAILED as soon as any branch failed
    pub fn status(&self) -> WorkStatus {
        if self.all_succeeded() {
            WorkStatus::Completed
        } else {
            WorkStatus::Failed
        }
    }

    pub fn context(&self) -> &WorkContext {
        &self.context
    }
}

impl From<ParallelFlowReport> for WorkReport {
    fn from(report: ParallelFlowReport) -> Self {
        WorkReport::Parallel(report)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkStatus::Completed => write!(f, "COMPLETED"),
            WorkStatus::Failed => write!(f, "FAILED"),
        }
    }
}
