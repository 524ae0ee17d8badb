//! Configuration types and structures

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::ConfigError;
use super::merge::EnvVars;
use crate::directory::SearchSettings;

/// Environment keys
pub mod keys {
    /// Directory host
    pub const LDAP_SERVER: &str = "LDAP_SERVER";
    /// Directory port
    pub const LDAP_PORT: &str = "LDAP_PORT";
    /// Encryption: empty or `none`, `ssl` (implicit TLS), `tls` (`StartTLS`)
    pub const LDAP_METHOD: &str = "LDAP_METHOD";
    /// Bind mode: `simple` or `anonymous`
    pub const LDAP_AUTH: &str = "LDAP_AUTH";
    /// Bind DN for simple binds
    pub const LDAP_BIND_DN: &str = "LDAP_BIND_DN";
    /// Bind password for simple binds
    pub const LDAP_PASSWORD: &str = "LDAP_PASSWORD";
    /// Search base
    pub const LDAP_BASE: &str = "LDAP_BASE";
    /// Attribute holding the user identifier
    pub const LDAP_UID: &str = "LDAP_UID";
    /// Extra filter clause
    pub const LDAP_FILTER: &str = "LDAP_FILTER";
    /// Attribute mapping overrides
    pub const LDAP_ATTRIBUTE_MAPPING: &str = "LDAP_ATTRIBUTE_MAPPING";
    /// Directory operation timeout
    pub const LDAP_TIMEOUT: &str = "LDAP_TIMEOUT";
    /// Store adapter, only `postgresql`
    pub const DB_ADAPTER: &str = "DB_ADAPTER";
    /// Store host
    pub const DB_HOST: &str = "DB_HOST";
    /// Store port
    pub const DB_PORT: &str = "DB_PORT";
    /// Database name
    pub const DB_NAME: &str = "DB_NAME";
    /// Database user
    pub const DB_USERNAME: &str = "DB_USERNAME";
    /// Database password
    pub const DB_PASSWORD: &str = "DB_PASSWORD";
    /// TLS mode towards the database
    pub const DB_SSLMODE: &str = "DB_SSLMODE";
    /// Provider marker of directory-managed rows
    pub const DB_PROVIDER: &str = "DB_PROVIDER";
    /// `rows` or `identifiers`
    pub const DB_FETCH_MODE: &str = "DB_FETCH_MODE";
    /// Schedule interval
    pub const INTERVAL: &str = "INTERVAL";
    /// Presence enables debug logging
    pub const DEBUG: &str = "DEBUG";
}

const DEFAULT_LDAP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_PROVIDER: &str = "greenlight";
const SUPPORTED_ADAPTER: &str = "postgresql";
const REDACTED: &str = "********";

/// Transport encryption towards the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encryption {
    /// Plain LDAP
    #[serde(rename = "none")]
    None,
    /// Implicit TLS (`ldaps://`)
    #[serde(rename = "ssl")]
    Tls,
    /// `StartTLS` upgrade on a plain connection
    #[serde(rename = "tls")]
    StartTls,
}

impl Encryption {
    /// Port used when `LDAP_PORT` is unset
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Tls => 636,
            Self::None | Self::StartTls => 389,
        }
    }
}

impl FromStr for Encryption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" | "plain" => Ok(Self::None),
            "ssl" => Ok(Self::Tls),
            "tls" => Ok(Self::StartTls),
            other => Err(format!("expected none, ssl or tls, got {other}")),
        }
    }
}

/// How to bind to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BindMode {
    /// Simple bind with a service account
    Simple {
        /// Bind DN
        bind_dn: String,
        /// Bind password
        password: String,
    },
    /// Anonymous bind
    Anonymous,
}

impl BindMode {
    fn from_env(env: &EnvVars) -> Result<Self, ConfigError> {
        match env.non_empty(keys::LDAP_AUTH).unwrap_or("simple") {
            "simple" => Ok(Self::Simple {
                bind_dn: env.require(keys::LDAP_BIND_DN)?.to_string(),
                password: env.get(keys::LDAP_PASSWORD).unwrap_or_default().to_string(),
            }),
            "anonymous" => Ok(Self::Anonymous),
            other => Err(ConfigError::UnsupportedAuth {
                mode: other.to_string(),
            }),
        }
    }
}

/// TLS mode towards the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Plain connection
    Disable,
    /// TLS if the server offers it
    Prefer,
    /// TLS or fail
    Require,
}

impl FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            other => Err(format!("expected disable, prefer or require, got {other}")),
        }
    }
}

/// What the store loads for managed users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Full rows, changes are detected per user
    Rows,
    /// Identifiers only, every user is re-sent
    Identifiers,
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rows" => Ok(Self::Rows),
            "identifiers" => Ok(Self::Identifiers),
            other => Err(format!("expected rows or identifiers, got {other}")),
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => f.write_str("rows"),
            Self::Identifiers => f.write_str("identifiers"),
        }
    }
}

/// Directory connection and search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectorySettings {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Transport encryption
    pub encryption: Encryption,
    /// Search base
    pub base_dn: String,
    /// Attribute holding the user identifier
    pub uid_attribute: String,
    /// Extra filter clause, may be empty
    pub extra_filter: String,
    /// Attribute mapping overrides
    pub attribute_mapping: String,
    /// Connect, bind and per-search timeout
    #[serde(serialize_with = "serialize_duration")]
    pub timeout: Duration,
    /// Bind mode and credentials
    pub auth: BindMode,
}

impl DirectorySettings {
    fn from_env(env: &EnvVars) -> Result<Self, ConfigError> {
        let encryption: Encryption = env.parse_or(keys::LDAP_METHOD, Encryption::None)?;

        Ok(Self {
            host: env.require(keys::LDAP_SERVER)?.to_string(),
            port: env.parse_or(keys::LDAP_PORT, encryption.default_port())?,
            encryption,
            base_dn: env.require(keys::LDAP_BASE)?.to_string(),
            uid_attribute: env.require(keys::LDAP_UID)?.to_string(),
            extra_filter: env.get(keys::LDAP_FILTER).unwrap_or_default().to_string(),
            attribute_mapping: env
                .get(keys::LDAP_ATTRIBUTE_MAPPING)
                .unwrap_or_default()
                .to_string(),
            timeout: env
                .duration(keys::LDAP_TIMEOUT)?
                .unwrap_or(DEFAULT_LDAP_TIMEOUT),
            auth: BindMode::from_env(env)?,
        })
    }

    /// Per-user search parameters
    #[must_use]
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            base_dn: self.base_dn.clone(),
            uid_attribute: self.uid_attribute.clone(),
            extra_filter: self.extra_filter.clone(),
        }
    }
}

/// Relational store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSettings {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database name
    pub database: String,
    /// Database user
    pub username: String,
    /// Database password
    pub password: String,
    /// TLS mode
    pub ssl_mode: SslMode,
    /// Provider marker of directory-managed rows
    pub provider: String,
    /// Full rows or identifiers only
    pub fetch_mode: FetchMode,
}

impl StoreSettings {
    fn from_env(env: &EnvVars) -> Result<Self, ConfigError> {
        let adapter = env.non_empty(keys::DB_ADAPTER).unwrap_or(SUPPORTED_ADAPTER);
        if adapter != SUPPORTED_ADAPTER {
            return Err(ConfigError::UnsupportedAdapter {
                adapter: adapter.to_string(),
            });
        }

        Ok(Self {
            host: env.require(keys::DB_HOST)?.to_string(),
            port: env.parse_or(keys::DB_PORT, DEFAULT_DB_PORT)?,
            database: env.require(keys::DB_NAME)?.to_string(),
            username: env.require(keys::DB_USERNAME)?.to_string(),
            password: env.get(keys::DB_PASSWORD).unwrap_or_default().to_string(),
            ssl_mode: env.parse_or(keys::DB_SSLMODE, SslMode::Disable)?,
            provider: env
                .non_empty(keys::DB_PROVIDER)
                .unwrap_or(DEFAULT_PROVIDER)
                .to_string(),
            fetch_mode: env.parse_or(keys::DB_FETCH_MODE, FetchMode::Rows)?,
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncConfig {
    /// Schedule interval, a single pass when unset
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_interval"
    )]
    pub interval: Option<Duration>,
    /// Debug logging requested
    pub debug: bool,
    /// Directory settings
    pub directory: DirectorySettings,
    /// Store settings
    pub store: StoreSettings,
}

impl SyncConfig {
    /// Parse the configuration from merged env vars
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value is invalid.
    pub fn from_env(env: &EnvVars) -> Result<Self, ConfigError> {
        Ok(Self {
            interval: env.duration(keys::INTERVAL)?,
            debug: env.contains(keys::DEBUG),
            directory: DirectorySettings::from_env(env)?,
            store: StoreSettings::from_env(env)?,
        })
    }

    /// Copy with every secret masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if let BindMode::Simple { password, .. } = &mut redacted.directory.auth {
            *password = REDACTED.to_string();
        }
        redacted.store.password = REDACTED.to_string();
        redacted
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*value))
}

#[allow(clippy::ref_option)]
fn serialize_interval<S: Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(interval) => serialize_duration(interval, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> EnvVars {
        EnvVars::from_pairs([
            ("LDAP_SERVER", "ldap.example.org"),
            ("LDAP_METHOD", "ssl"),
            ("LDAP_AUTH", "simple"),
            ("LDAP_BIND_DN", "cn=admin,dc=example,dc=org"),
            ("LDAP_PASSWORD", "ldap-secret"),
            ("LDAP_BASE", "dc=example,dc=org"),
            ("LDAP_UID", "uid"),
            ("LDAP_FILTER", "(objectClass=person)"),
            ("DB_ADAPTER", "postgresql"),
            ("DB_HOST", "db"),
            ("DB_NAME", "greenlight_production"),
            ("DB_USERNAME", "postgres"),
            ("DB_PASSWORD", "db-secret"),
            ("INTERVAL", "5m"),
        ])
    }

    #[test]
    fn test_from_env_with_defaults() {
        let config = SyncConfig::from_env(&full_env()).unwrap();

        assert_eq!(config.interval, Some(Duration::from_secs(300)));
        assert!(!config.debug);
        assert_eq!(config.directory.encryption, Encryption::Tls);
        assert_eq!(config.directory.port, 636);
        assert_eq!(config.directory.timeout, DEFAULT_LDAP_TIMEOUT);
        assert_eq!(config.store.port, 5432);
        assert_eq!(config.store.ssl_mode, SslMode::Disable);
        assert_eq!(config.store.provider, "greenlight");
        assert_eq!(config.store.fetch_mode, FetchMode::Rows);
    }

    #[test]
    fn test_encryption_values() {
        assert_eq!("".parse::<Encryption>(), Ok(Encryption::None));
        assert_eq!("ssl".parse::<Encryption>(), Ok(Encryption::Tls));
        assert_eq!("TLS".parse::<Encryption>(), Ok(Encryption::StartTls));
        assert!("ldaps".parse::<Encryption>().is_err());
        assert_eq!(Encryption::StartTls.default_port(), 389);
    }

    #[test]
    fn test_anonymous_bind_needs_no_dn() {
        let env = EnvVars::from_pairs([("LDAP_AUTH", "anonymous")]);
        assert_eq!(BindMode::from_env(&env).unwrap(), BindMode::Anonymous);
    }

    #[test]
    fn test_user_bind_is_unsupported() {
        let env = EnvVars::from_pairs([("LDAP_AUTH", "user")]);
        let err = BindMode::from_env(&env).unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedAuth { .. }));
        assert_eq!(err.to_string(), "user is an unsupported LDAP_AUTH");
    }

    #[test]
    fn test_unsupported_adapter() {
        let env = EnvVars::from_pairs([("DB_ADAPTER", "mysql")]);
        let err = StoreSettings::from_env(&env).unwrap_err();

        assert!(err.to_string().contains("mysql is an unsupported DB_ADAPTER"));
    }

    #[test]
    fn test_missing_required_key() {
        let env = EnvVars::from_pairs([("LDAP_SERVER", "ldap.example.org")]);
        let err = DirectorySettings::from_env(&env).unwrap_err();

        assert!(matches!(err, ConfigError::Missing { key: "LDAP_BASE" }));
    }

    #[test]
    fn test_fetch_mode_values() {
        assert_eq!("identifiers".parse::<FetchMode>(), Ok(FetchMode::Identifiers));
        assert!("all".parse::<FetchMode>().is_err());
        assert_eq!(FetchMode::Rows.to_string(), "rows");
    }

    #[test]
    fn test_redacted_masks_passwords() {
        let config = SyncConfig::from_env(&full_env()).unwrap().redacted();

        assert_eq!(config.store.password, REDACTED);
        assert_eq!(
            config.directory.auth,
            BindMode::Simple {
                bind_dn: "cn=admin,dc=example,dc=org".to_string(),
                password: REDACTED.to_string(),
            }
        );
    }

    #[test]
    fn test_serialize_as_toml() {
        let config = SyncConfig::from_env(&full_env()).unwrap().redacted();
        let rendered = toml::to_string_pretty(&config).unwrap();

        assert!(rendered.contains("interval = \"5m\""));
        assert!(rendered.contains("[directory]"));
        assert!(rendered.contains("encryption = \"ssl\""));
        assert!(rendered.contains("timeout = \"10s\""));
        assert!(rendered.contains("mode = \"simple\""));
        assert!(rendered.contains("fetch_mode = \"rows\""));
        assert!(!rendered.contains("db-secret"));
        assert!(!rendered.contains("ldap-secret"));
    }
}
