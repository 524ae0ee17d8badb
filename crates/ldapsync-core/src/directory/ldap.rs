//! LDAP directory adapter built on `ldap3`

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapResult, Scope, SearchEntry};
use tracing::{debug, info, warn};

use super::{DirectoryDialer, DirectorySession, SearchRequest};
use crate::config::{BindMode, DirectorySettings, Encryption};
use crate::error::DirectoryError;
use crate::resolver::RawDirectoryRecord;

/// Dials and binds to the configured LDAP server
#[derive(Debug, Clone)]
pub struct LdapDialer {
    settings: DirectorySettings,
}

impl LdapDialer {
    /// Create a dialer
    #[must_use]
    pub const fn new(settings: DirectorySettings) -> Self {
        Self { settings }
    }

    /// Server URL, `ldaps://` for implicit TLS and `ldap://` otherwise
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = match self.settings.encryption {
            Encryption::Tls => "ldaps",
            Encryption::None | Encryption::StartTls => "ldap",
        };
        format!("{scheme}://{}:{}", self.settings.host, self.settings.port)
    }

    fn bind_credentials(&self) -> (&str, &str) {
        match &self.settings.auth {
            BindMode::Simple { bind_dn, password } => (bind_dn.as_str(), password.as_str()),
            BindMode::Anonymous => ("", ""),
        }
    }
}

#[async_trait]
impl DirectoryDialer for LdapDialer {
    async fn dial(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let url = self.url();
        debug!(url = %url, encryption = ?self.settings.encryption, "Connecting to LDAP server");

        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(self.settings.timeout)
            .set_starttls(self.settings.encryption == Encryption::StartTls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
            .await
            .map_err(|e| DirectoryError::Connect {
                url: url.clone(),
                source: Box::new(e),
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let (bind_dn, password) = self.bind_credentials();
        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        ldap.with_timeout(self.settings.timeout)
            .simple_bind(bind_dn, password)
            .await
            .and_then(LdapResult::success)
            .map_err(|e| DirectoryError::Bind {
                bind_dn: bind_dn.to_string(),
                source: Box::new(e),
            })?;

        info!(host = %self.settings.host, "LDAP connection established");

        Ok(Box::new(LdapSession {
            ldap,
            timeout: self.settings.timeout,
        }))
    }
}

/// Bound LDAP connection
///
/// Every search is limited to the configured timeout.
pub struct LdapSession {
    ldap: Ldap,
    timeout: Duration,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<RawDirectoryRecord>, DirectoryError> {
        debug!(
            user = %request.user,
            filter = %request.filter,
            base_dn = %request.base_dn,
            "Searching LDAP"
        );

        let (entries, _) = self
            .ldap
            .with_timeout(self.timeout)
            .search(
                &request.base_dn,
                Scope::Subtree,
                &request.filter,
                &request.attributes,
            )
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| DirectoryError::Search {
                user: request.user.clone(),
                source: Box::new(e),
            })?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(entry_to_record)
            .collect())
    }

    async fn close(&mut self) {
        if let Err(e) = self.ldap.unbind().await {
            warn!(error = %e, "LDAP unbind failed");
        }
    }
}

/// Convert a search entry into a raw record
///
/// Binary-only attributes are not carried over.
fn entry_to_record(entry: SearchEntry) -> RawDirectoryRecord {
    let mut record = RawDirectoryRecord::new(entry.dn);
    for (name, values) in entry.attrs {
        record.insert(&name, values);
    }
    record
}
