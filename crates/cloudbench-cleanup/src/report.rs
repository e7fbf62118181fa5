//! Cleanup results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cloudbench_core::{AtomicAction, CloudError, ResourceId};

use crate::error::CleanupError;
use crate::spec::ResourceSpec;

/// Terminal state of one cleanup task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOutcome {
    Deleted,
    FailedDelete,
    FailedTimeout,
}

impl TaskOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::FailedDelete => "failed_delete",
            Self::FailedTimeout => "failed_timeout",
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a task did not reach `deleted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Every delete attempt failed; `error` is the last one.
    DeleteFailed { attempts: u32, error: CloudError },
    /// Delete was accepted but never confirmed.
    Timeout { waited: Duration },
    /// The worker running the task panicked.
    WorkerPanicked,
}

impl FailureReason {
    #[must_use]
    pub fn outcome(&self) -> TaskOutcome {
        match self {
            Self::DeleteFailed { .. } | Self::WorkerPanicked => TaskOutcome::FailedDelete,
            Self::Timeout { .. } => TaskOutcome::FailedTimeout,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteFailed { attempts, error } => {
                write!(f, "delete failed after {} attempt(s): {}", attempts, error)
            }
            Self::Timeout { waited } => {
                write!(f, "deletion not confirmed within {:?}", waited)
            }
            Self::WorkerPanicked => f.write_str("cleanup worker panicked"),
        }
    }
}

/// One resource that could not be cleaned up.
#[derive(Debug, Clone)]
pub struct CleanupFailure {
    pub resource_id: ResourceId,
    pub resource_name: Option<String>,
    pub spec: Arc<ResourceSpec>,
    /// Label of the scope that discovered the resource.
    pub scope: String,
    pub reason: FailureReason,
}

impl CleanupFailure {
    #[must_use]
    pub fn outcome(&self) -> TaskOutcome {
        self.reason.outcome()
    }
}

/// A listing that failed for one resource type in one scope.
#[derive(Debug)]
pub struct ListFailure {
    pub spec: Arc<ResourceSpec>,
    pub scope: String,
    pub error: CleanupError,
}

/// Aggregated result of a cleanup call.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Resources confirmed deleted.
    pub deleted: usize,
    /// Failed tasks, grouped by resource type in processing order.
    pub failed: Vec<CleanupFailure>,
    pub list_failures: Vec<ListFailure>,
    /// Listed resources the deletion policy left alone.
    pub skipped: usize,
    /// Delete calls issued, retries included.
    pub delete_attempts: usize,
    /// Status checks issued while confirming deletions.
    pub status_polls: usize,
    /// One `cleanup.<service>.<resource>` timing per processed type.
    pub actions: Vec<AtomicAction>,
}

impl CleanupReport {
    /// True when nothing failed, listing included.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.list_failures.is_empty()
    }

    /// Failed tasks with the given outcome.
    pub fn failures_with(&self, outcome: TaskOutcome) -> impl Iterator<Item = &CleanupFailure> {
        self.failed.iter().filter(move |f| f.outcome() == outcome)
    }
}
