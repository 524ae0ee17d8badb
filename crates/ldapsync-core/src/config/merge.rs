//! Env source merging with precedence rules
//!
//! Precedence, highest first:
//! 1. Process environment
//! 2. Env file from the CLI flag
//! 3. `.env` in the working directory
//! 4. Global env file
//!
//! A key set by a higher layer replaces the value of any lower layer.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::ConfigError;
use super::discovery::EnvFiles;

/// Merged environment-style settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: BTreeMap<String, String>,
}

impl EnvVars {
    /// Build from key/value pairs, later pairs win
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value of a key, possibly empty
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value of a key, `None` when unset or empty
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Whether a key is present at all, even with an empty value
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Value of a required key
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the key is unset or empty.
    pub fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
        self.non_empty(key).ok_or(ConfigError::Missing { key })
    }

    /// Parse a key, falling back to `default` when unset or empty
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value does not parse.
    pub fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.non_empty(key) {
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: value.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Parse a human-readable duration such as `90s` or `1h 30m`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value is not a duration.
    pub fn duration(&self, key: &'static str) -> Result<Option<Duration>, ConfigError> {
        self.non_empty(key)
            .map(|value| {
                humantime::parse_duration(value).map_err(|e| ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn insert(&mut self, key: String, value: String) {
        self.vars.insert(key, value);
    }
}

/// Env source merger
pub struct EnvMerger;

impl EnvMerger {
    /// Merge env files and process variables with precedence rules
    ///
    /// # Errors
    ///
    /// Returns an error if an env file cannot be read or parsed.
    pub fn merge<I>(files: &EnvFiles, process: I) -> Result<EnvVars, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged = EnvVars::default();

        // Lowest to highest precedence
        for path in [&files.global, &files.local, &files.cli].into_iter().flatten() {
            Self::merge_file(&mut merged, path)?;
        }

        for (key, value) in process {
            merged.insert(key, value);
        }

        Ok(merged)
    }

    fn merge_file(base: &mut EnvVars, path: &Path) -> Result<(), ConfigError> {
        let env_err = |source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        for item in dotenvy::from_path_iter(path).map_err(env_err)? {
            let (key, value) = item.map_err(env_err)?;
            base.insert(key, value);
        }

        Ok(())
    }
}
