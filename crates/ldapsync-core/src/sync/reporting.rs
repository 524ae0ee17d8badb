//! Sync pass reporting
//!
//! [`SyncObserver`] receives events while a pass runs. The engine never
//! touches global logging state itself, [`TracingObserver`] forwards events
//! to `tracing`. [`SyncReporter`] renders the final report for humans.

use std::fmt::Write;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::SyncReport;
use crate::comparison::AttributeChange;
use crate::error::DirectoryError;
use crate::resolver::Resolution;

/// Receives progress events of a sync pass
///
/// All methods default to doing nothing.
pub trait SyncObserver: Send + Sync {
    /// A pass is starting
    fn pass_started(&self) {}

    /// Managed users were loaded from the store
    fn users_fetched(&self, _count: usize, _degraded: bool) {}

    /// A user was resolved from the directory
    fn user_resolved(&self, _user: &str, _resolution: &Resolution) {}

    /// A stored column differs from the directory
    fn attribute_changed(&self, _user: &str, _change: &AttributeChange) {}

    /// A user was added to the update batch
    fn user_changed(&self, _user: &str) {}

    /// A user was skipped because the directory lookup failed
    fn user_failed(&self, _user: &str, _error: &DirectoryError) {}

    /// A shutdown interrupted the user loop, nothing will be committed
    fn pass_cancelled(&self, _remaining: usize) {}

    /// The update batch was committed
    fn batch_committed(&self, _rows: usize) {}

    /// The pass completed
    fn pass_finished(&self, _report: &SyncReport) {}
}

/// Forwards pass events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn pass_started(&self) {
        info!("Starting LDAP sync");
    }

    fn users_fetched(&self, count: usize, degraded: bool) {
        debug!(amount = count, "Fetched users from the database");
        if degraded {
            warn!("Stored rows unavailable, every resolved user will be written");
        }
    }

    fn user_resolved(&self, user: &str, resolution: &Resolution) {
        debug!(
            user = %user,
            attributes = ?resolution.attributes,
            unresolved = ?resolution.unresolved,
            "Fetched user data"
        );
    }

    fn attribute_changed(&self, user: &str, change: &AttributeChange) {
        debug!(
            user = %user,
            attribute = %change.column,
            old = change.old.as_deref().unwrap_or_default(),
            new = %change.new,
            "User attribute has changed"
        );
    }

    fn user_changed(&self, user: &str) {
        info!(user = %user, "User has changed");
    }

    fn user_failed(&self, user: &str, error: &DirectoryError) {
        warn!(user = %user, error = %error_chain(error), "Failed to query LDAP user");
    }

    fn pass_cancelled(&self, remaining: usize) {
        warn!(remaining, "Shutdown requested, discarding this pass");
    }

    fn batch_committed(&self, rows: usize) {
        info!(updates = rows, "Updated database users");
    }

    fn pass_finished(&self, report: &SyncReport) {
        info!(
            checked = report.checked,
            changed = report.changed,
            failed = report.failed(),
            time = %humantime::format_duration(report.elapsed_millis()),
            "Finished LDAP sync"
        );
    }
}

/// Render an error with all of its sources, separated by `: `
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(rendered, ": {cause}");
        source = cause.source();
    }
    rendered
}

/// Sync pass reporter
pub struct SyncReporter;

impl SyncReporter {
    /// Generate a summary report
    #[must_use]
    pub fn generate_summary(report: &SyncReport) -> String {
        let mut output = String::new();

        output.push_str("\n=== Sync Summary ===\n");
        let _ = writeln!(output, "Checked:  {}", report.checked);
        let _ = writeln!(output, "Changed:  {}", report.changed);
        let _ = writeln!(output, "Updated:  {}", report.updated);
        let _ = writeln!(output, "Failed:   {}", report.failed());
        let _ = writeln!(
            output,
            "Elapsed:  {}",
            humantime::format_duration(report.elapsed_millis())
        );

        if report.degraded {
            output.push_str("Mode:     degraded (no stored rows, all users re-sent)\n");
        }

        if !report.failures.is_empty() {
            let _ = writeln!(output, "\nFailures ({}):", report.failures.len());
            for failure in &report.failures {
                let _ = writeln!(output, "  - {}: {}", failure.user, failure.reason);
            }
        }

        if report.cancelled {
            output.push_str("Status: ✗ Cancelled, nothing committed\n");
        } else if report.is_success() {
            output.push_str("Status: ✓ Success\n");
        } else {
            output.push_str("Status: ✗ Completed with failures\n");
        }

        output
    }
}

impl SyncReport {
    /// Elapsed time truncated to milliseconds, for display
    #[must_use]
    pub fn elapsed_millis(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}
