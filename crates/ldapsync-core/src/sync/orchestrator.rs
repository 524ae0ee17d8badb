//! Sync orchestration - coordinates one pass over all managed users

use std::sync::Arc;
use std::time::Instant;

use super::batch::UpdateBatch;
use super::reporting::{SyncObserver, TracingObserver, error_chain};
use super::{SyncReport, UserFailure};
use crate::comparison::{ChangeDetector, Detection, UpdateRecord};
use crate::directory::{DirectoryDialer, DirectorySession, SearchSettings};
use crate::error::{DirectoryError, Result, SyncError};
use crate::mapping::{AttributeMapping, Projection};
use crate::resolver::{DirectoryResolver, RawDirectoryRecord};
use crate::schedule::Shutdown;
use crate::store::{StoreConnector, StoredUserRecord};

/// Main sync engine
///
/// The engine holds no state between passes. Every call to [`Self::run`]
/// opens fresh store and directory connections and closes them before it
/// returns.
pub struct SyncEngine {
    mapping: AttributeMapping,
    projection: Projection,
    search: SearchSettings,
    requested_attributes: Vec<String>,
    store: Box<dyn StoreConnector>,
    directory: Box<dyn DirectoryDialer>,
    observer: Arc<dyn SyncObserver>,
    shutdown: Option<Shutdown>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// The mapping table is built from `overrides` once, up front.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if `overrides` is malformed.
    pub fn new(
        overrides: &str,
        search: SearchSettings,
        store: Box<dyn StoreConnector>,
        directory: Box<dyn DirectoryDialer>,
    ) -> Result<Self> {
        let mapping = AttributeMapping::build(overrides)?;
        let requested_attributes = mapping.source_names();

        Ok(Self {
            mapping,
            projection: Projection::GREENLIGHT,
            search,
            requested_attributes,
            store,
            directory,
            observer: Arc::new(TracingObserver),
            shutdown: None,
        })
    }

    /// Send pass events to `observer` instead of `tracing`
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stop between users once `shutdown` is triggered
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Execute one sync pass
    ///
    /// Per-user directory failures are counted in the report and the pass
    /// moves on. If a shutdown is observed between users the partial batch is
    /// discarded and the report comes back with `cancelled` set.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or directory cannot be reached, managed
    /// users cannot be listed, or the batch commit fails.
    pub async fn run(&self) -> Result<SyncReport> {
        let started = Instant::now();
        self.observer.pass_started();

        let mut store = self
            .store
            .connect()
            .await
            .map_err(SyncError::StoreConnect)?;
        let users = match store.fetch_managed_users().await {
            Ok(users) => users,
            Err(err) => {
                store.close().await;
                return Err(SyncError::Fetch(err));
            }
        };
        self.observer.users_fetched(users.len(), users.is_degraded());

        let mut session = match self.directory.dial().await {
            Ok(session) => session,
            Err(err) => {
                store.close().await;
                return Err(SyncError::DirectoryDial(err));
            }
        };

        let mut report = SyncReport {
            degraded: users.is_degraded(),
            ..SyncReport::default()
        };
        let mut batch = UpdateBatch::new();

        for (user, stored) in users.iter() {
            if self.shutdown_requested() {
                report.cancelled = true;
                self.observer.pass_cancelled(users.len() - report.checked);
                break;
            }

            report.checked += 1;
            match self.sync_user(session.as_mut(), user, stored).await {
                Ok(Some(record)) => {
                    self.observer.user_changed(user);
                    batch.push(record);
                }
                Ok(None) => {}
                Err(error) => {
                    self.observer.user_failed(user, &error);
                    report.failures.push(UserFailure {
                        user: user.to_string(),
                        reason: error_chain(&error),
                    });
                }
            }
        }

        session.close().await;
        report.changed = batch.len();

        let commit = !report.cancelled && !batch.is_empty();
        let committed = if commit {
            store.apply_batch(&batch).await
        } else {
            Ok(())
        };
        store.close().await;
        committed.map_err(SyncError::Commit)?;

        if commit {
            report.updated = batch.len();
            self.observer.batch_committed(batch.len());
        }

        report.elapsed = started.elapsed();
        self.observer.pass_finished(&report);
        Ok(report)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(Shutdown::is_triggered)
    }

    /// Resolve one user and decide whether it needs an update
    ///
    /// Users without a loaded row (degraded mode) are always emitted.
    async fn sync_user(
        &self,
        session: &mut dyn DirectorySession,
        user: &str,
        stored: Option<&StoredUserRecord>,
    ) -> std::result::Result<Option<UpdateRecord>, DirectoryError> {
        let raw = self.lookup(session, user).await?;
        let resolution = DirectoryResolver::resolve(&self.mapping, &self.projection, &raw);
        self.observer.user_resolved(user, &resolution);

        let identifier_column = self.projection.identifier_column();
        let Some(stored) = stored else {
            return Ok(Some(UpdateRecord::new(
                identifier_column,
                user,
                resolution.attributes,
            )));
        };

        match ChangeDetector::detect(identifier_column, stored, resolution.attributes) {
            Detection::Unchanged => Ok(None),
            Detection::Changed { record, changes } => {
                for change in &changes {
                    self.observer.attribute_changed(user, change);
                }
                Ok(Some(record))
            }
        }
    }

    /// Search for `user` and require exactly one entry
    async fn lookup(
        &self,
        session: &mut dyn DirectorySession,
        user: &str,
    ) -> std::result::Result<RawDirectoryRecord, DirectoryError> {
        let request = self.search.request_for(user, &self.requested_attributes);
        let mut entries = session.search(&request).await?;

        let count = entries.len();
        match entries.pop() {
            Some(entry) if count == 1 => Ok(entry),
            _ => Err(DirectoryError::UnexpectedEntryCount {
                user: user.to_string(),
                count,
            }),
        }
    }
}
