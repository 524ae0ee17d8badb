//! Relational store collaborator
//!
//! The store lists directory-managed users and applies an update batch as a
//! single transaction. [`postgres`] implements it for Greenlight's schema.

pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::sync::UpdateBatch;

/// Current stored values of one managed user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredUserRecord {
    identifier: String,
    columns: BTreeMap<String, String>,
}

impl StoredUserRecord {
    /// Create a record without any loaded columns
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Set the stored value of a column
    pub fn insert(&mut self, column: &str, value: impl Into<String>) {
        self.columns.insert(column.to_string(), value.into());
    }

    /// Unique external identifier
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Stored value of a column, `None` if it was not loaded
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// All loaded columns
    #[must_use]
    pub const fn columns(&self) -> &BTreeMap<String, String> {
        &self.columns
    }
}

/// Managed users as returned by the store
///
/// Deployments that only list identifiers cannot be diffed. Every resolved
/// user is then written unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedUsers {
    /// Full rows keyed by identifier
    Rows(BTreeMap<String, StoredUserRecord>),
    /// Bare identifiers only (degraded mode)
    Identifiers(Vec<String>),
}

impl ManagedUsers {
    /// Collect full rows, keyed by their identifier
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = StoredUserRecord>) -> Self {
        Self::Rows(
            rows.into_iter()
                .map(|row| (row.identifier().to_string(), row))
                .collect(),
        )
    }

    /// Number of users
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Identifiers(ids) => ids.len(),
        }
    }

    /// Whether there are no users
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether stored rows are missing, so no diff is possible
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Identifiers(_))
    }

    /// Iterate `(identifier, stored row if loaded)`
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, Option<&StoredUserRecord>)> + Send + '_> {
        match self {
            Self::Rows(rows) => Box::new(rows.iter().map(|(id, row)| (id.as_str(), Some(row)))),
            Self::Identifiers(ids) => Box::new(ids.iter().map(|id| (id.as_str(), None))),
        }
    }
}

/// Opens a store connection for one pass
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connect and authenticate
    async fn connect(&self) -> Result<Box<dyn UserStore>, StoreError>;
}

/// An open store connection
#[async_trait]
pub trait UserStore: Send {
    /// List all directory-managed users
    async fn fetch_managed_users(&mut self) -> Result<ManagedUsers, StoreError>;

    /// Write every record of the batch in one transaction
    ///
    /// Either all records are applied or none is.
    async fn apply_batch(&mut self, batch: &UpdateBatch) -> Result<(), StoreError>;

    /// Terminate the connection
    ///
    /// Close errors are logged, not returned.
    async fn close(self: Box<Self>);
}
