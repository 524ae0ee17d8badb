//! Directory collaborator
//!
//! One [`DirectorySession`] is dialed per pass and reused for every user.
//! Searches return all matching entries, the engine enforces that exactly
//! one matched.

pub mod ldap;

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::resolver::RawDirectoryRecord;

/// Where and how users are looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Search base
    pub base_dn: String,
    /// Attribute holding the user identifier
    pub uid_attribute: String,
    /// Extra filter clause appended inside the conjunction, may be empty
    pub extra_filter: String,
}

impl SearchSettings {
    /// Filter matching one user: `(&(<uid attribute>=<user>)<extra filter>)`
    ///
    /// The user value is escaped (RFC 4515), the extra filter is taken as is.
    #[must_use]
    pub fn filter_for(&self, user: &str) -> String {
        format!(
            "(&({}={}){})",
            self.uid_attribute,
            ::ldap3::ldap_escape(user),
            self.extra_filter
        )
    }

    /// Full search request for one user
    #[must_use]
    pub fn request_for(&self, user: &str, attributes: &[String]) -> SearchRequest {
        SearchRequest {
            user: user.to_string(),
            base_dn: self.base_dn.clone(),
            filter: self.filter_for(user),
            attributes: attributes.to_vec(),
        }
    }
}

/// A subtree search for a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// User identifier being looked up
    pub user: String,
    /// Search base
    pub base_dn: String,
    /// LDAP filter
    pub filter: String,
    /// Requested attribute names
    pub attributes: Vec<String>,
}

/// Opens a bound directory session
#[async_trait]
pub trait DirectoryDialer: Send + Sync {
    /// Connect, negotiate encryption and bind
    async fn dial(&self) -> Result<Box<dyn DirectorySession>, DirectoryError>;
}

/// A bound directory connection
#[async_trait]
pub trait DirectorySession: Send {
    /// Run a search and return every matching entry
    async fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<RawDirectoryRecord>, DirectoryError>;

    /// Release the connection
    async fn close(&mut self);
}
