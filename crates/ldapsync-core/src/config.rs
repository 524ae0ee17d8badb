//! Configuration discovery, merging and validation
//!
//! Settings are environment-style `KEY=value` pairs. They are read from
//! env files and the process environment:
//! - Env file discovery from an explicit path, the working directory and the
//!   XDG config directory
//! - Layered merge where the process environment wins over any file
//! - Typed settings for the directory, the store and the schedule
//! - Validation before any connection is attempted

mod discovery;
mod merge;
mod types;
mod validation;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use discovery::{ConfigDiscovery, EnvFiles};
pub use merge::{EnvMerger, EnvVars};
pub use types::{
    BindMode, DirectorySettings, Encryption, FetchMode, SslMode, StoreSettings, SyncConfig, keys,
};
pub use validation::ConfigValidator;

use crate::error::MappingError;

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key is unset or empty
    #[error("{key} is not set")]
    Missing {
        /// Environment key
        key: &'static str,
    },
    /// A key holds a value that cannot be used
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        /// Environment key
        key: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
    /// `DB_ADAPTER` names anything but `PostgreSQL`
    #[error("{adapter} is an unsupported DB_ADAPTER, postgresql is the only supported adapter")]
    UnsupportedAdapter {
        /// Configured adapter
        adapter: String,
    },
    /// `LDAP_AUTH` names a bind mode that cannot be used for syncing
    #[error("{mode} is an unsupported LDAP_AUTH")]
    UnsupportedAuth {
        /// Configured mode
        mode: String,
    },
    /// The env file given on the command line does not exist
    #[error("env file {} does not exist", path.display())]
    EnvFileNotFound {
        /// Requested path
        path: PathBuf,
    },
    /// An env file could not be read or parsed
    #[error("cannot read env file {}", path.display())]
    EnvFile {
        /// File being read
        path: PathBuf,
        /// Parser error
        #[source]
        source: dotenvy::Error,
    },
    /// `LDAP_ATTRIBUTE_MAPPING` does not parse
    #[error("invalid LDAP_ATTRIBUTE_MAPPING")]
    Mapping(#[from] MappingError),
}

/// Where settings are read from
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSource<'a> {
    /// Env file passed on the command line
    pub env_file: Option<&'a Path>,
    /// Ignore all env files, use the process environment only
    pub no_env_file: bool,
}

/// Coordinates discovery, merging, parsing and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Merge all env sources into one key/value set
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit env file is missing or any env file
    /// cannot be parsed.
    pub fn load_env(source: &ConfigSource<'_>) -> Result<EnvVars, ConfigError> {
        let files = if source.no_env_file {
            EnvFiles::default()
        } else {
            ConfigDiscovery::discover(source.env_file)?
        };

        EnvMerger::merge(&files, process_env())
    }

    /// Load, parse and validate the full configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any source is unreadable or the result is invalid.
    pub fn load(source: &ConfigSource<'_>) -> Result<SyncConfig, ConfigError> {
        let env = Self::load_env(source)?;
        Self::from_env(&env)
    }

    /// Parse and validate a configuration from merged env vars
    ///
    /// # Errors
    ///
    /// Returns an error if a key is missing or invalid.
    pub fn from_env(env: &EnvVars) -> Result<SyncConfig, ConfigError> {
        let config = SyncConfig::from_env(env)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}

/// Process environment, skipping entries that are not valid UTF-8
fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}
