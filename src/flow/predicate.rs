// ABOUTME: Predicates over work reports used by conditional and repeating flows
// ABOUTME: Provides constant, status-based and closure-based variants

use std::sync::Arc;

use crate::engine::{WorkReport, WorkStatus};

type PredicateFn = Arc<dyn Fn(&WorkReport) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum ReportPredicate {
    AlwaysTrue,
    AlwaysFalse,
    Completed,
    Failed,
    Custom(PredicateFn),
}

impl ReportPredicate {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&WorkReport) -> bool + Send + Sync + 'static,
    {
        ReportPredicate::Custom(Arc::new(predicate))
    }

    pub fn apply(&self, report: &WorkReport) -> bool {
        match self {
            ReportPredicate::AlwaysTrue => true,
            ReportPredicate::AlwaysFalse => false,
            ReportPredicate::Completed => report.status() == WorkStatus::Completed,
            ReportPredicate::Failed => report.status() == WorkStatus::Failed,
            ReportPredicate::Custom(predicate) => predicate(report),
        }
    }
}

impl std::fmt::Debug for ReportPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportPredicate::AlwaysTrue => write!(f, "AlwaysTrue"),
            ReportPredicate::AlwaysFalse => write!(f, "AlwaysFalse"),
            ReportPredicate::Completed => write!(f, "Completed"),
            ReportPredicate::Failed => write!(f, "Failed"),
            ReportPredicate::Custom(_) => write!(f, "Custom"),
        }
    }
}
