//! Error taxonomy
//!
//! Per-user directory failures are recovered inside a pass. Everything else
//! surfaces as a [`SyncError`] and aborts the pass it happened in.

use thiserror::Error;

pub use crate::config::ConfigError;

/// Boxed adapter error kept as the `source` of collaborator errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to build the attribute mapping table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A non-empty override directive contained no `=`
    #[error("mapping {directive} cannot be split into key=value")]
    MalformedDirective {
        /// The offending directive
        directive: String,
    },
}

/// Failure reported by the directory collaborator
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory server could not be reached
    #[error("cannot connect to directory at {url}")]
    Connect {
        /// Server URL that was dialed
        url: String,
        /// Underlying transport error
        #[source]
        source: BoxError,
    },
    /// The server rejected the bind
    #[error("directory bind failed for {bind_dn:?}")]
    Bind {
        /// DN used for the bind (empty for anonymous)
        bind_dn: String,
        /// Underlying protocol error
        #[source]
        source: BoxError,
    },
    /// The search for a single user failed
    #[error("directory search for {user} failed")]
    Search {
        /// User identifier that was queried
        user: String,
        /// Underlying protocol error
        #[source]
        source: BoxError,
    },
    /// The search did not resolve to exactly one entry
    #[error("expected exactly one directory entry for {user}, got {count}")]
    UnexpectedEntryCount {
        /// User identifier that was queried
        user: String,
        /// Number of entries returned
        count: usize,
    },
}

/// Failure reported by the relational store collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the credentials
    #[error("cannot connect to the user store")]
    Connect(#[source] BoxError),
    /// Listing managed users failed
    #[error("cannot fetch managed users")]
    Fetch(#[source] BoxError),
    /// The batch transaction failed and was rolled back
    #[error("batch update of {rows} user(s) was rolled back")]
    Commit {
        /// Number of records in the rejected batch
        rows: usize,
        /// Underlying statement or commit error
        #[source]
        source: BoxError,
    },
}

/// Coarse error classes, used to decide how a failure propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad configuration, never retried automatically
    Configuration,
    /// Store or directory unreachable, retried on the next tick
    Connectivity,
    /// Batch commit failed and was rolled back
    Commit,
}

/// Pass-aborting failure
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration rejected before any I/O
    #[error("invalid attribute mapping")]
    Config(#[from] MappingError),
    /// Connecting to the store failed
    #[error("cannot establish database connection")]
    StoreConnect(#[source] StoreError),
    /// Fetching managed users failed
    #[error("cannot fetch users from the database")]
    Fetch(#[source] StoreError),
    /// Dialing or binding to the directory failed
    #[error("cannot establish directory connection")]
    DirectoryDial(#[source] DirectoryError),
    /// The batch update was rolled back
    #[error("failed to perform database update")]
    Commit(#[source] StoreError),
}

impl SyncError {
    /// Classify this error
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) => ErrorClass::Configuration,
            Self::StoreConnect(_) | Self::Fetch(_) | Self::DirectoryDial(_) => {
                ErrorClass::Connectivity
            }
            Self::Commit(_) => ErrorClass::Commit,
        }
    }
}

/// Result alias for pass-level operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_classes() {
        let config = SyncError::from(MappingError::MalformedDirective {
            directive: "email".to_string(),
        });
        assert_eq!(config.class(), ErrorClass::Configuration);

        let dial = SyncError::DirectoryDial(DirectoryError::UnexpectedEntryCount {
            user: "alice".to_string(),
            count: 0,
        });
        assert_eq!(dial.class(), ErrorClass::Connectivity);

        let commit = SyncError::Commit(StoreError::Commit {
            rows: 2,
            source: "constraint violated".into(),
        });
        assert_eq!(commit.class(), ErrorClass::Commit);
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = MappingError::MalformedDirective {
            directive: "email".to_string(),
        };
        assert!(err.to_string().contains("email"));

        let err = DirectoryError::UnexpectedEntryCount {
            user: "bob".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "expected exactly one directory entry for bob, got 2"
        );
    }
}
