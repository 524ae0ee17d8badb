//! One-way directory to store synchronization
//!
//! A pass lists managed users, resolves each through the directory, diffs
//! against the stored row and commits every changed user in one batch.

mod batch;
mod orchestrator;
mod reporting;

pub use batch::UpdateBatch;
pub use orchestrator::SyncEngine;
pub use reporting::{SyncObserver, SyncReporter, TracingObserver, error_chain};

use std::time::Duration;

/// A user skipped during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFailure {
    /// User identifier
    pub user: String,
    /// Rendered error chain
    pub reason: String,
}

/// Outcome of one sync pass
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Users looked up in the directory
    pub checked: usize,
    /// Users that differed from their stored row
    pub changed: usize,
    /// Users written by the committed batch
    pub updated: usize,
    /// Users skipped because the lookup failed
    pub failures: Vec<UserFailure>,
    /// Stored rows were unavailable, every user was emitted
    pub degraded: bool,
    /// A shutdown interrupted the pass, nothing was committed
    pub cancelled: bool,
    /// Wall time of the pass
    pub elapsed: Duration,
}

impl SyncReport {
    /// Number of skipped users
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether every user was checked without a failure
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}
