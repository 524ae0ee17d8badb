//! Env file discovery from multiple locations

use std::path::{Path, PathBuf};

use super::ConfigError;

/// Env file locations in order of precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFiles {
    /// File from the CLI flag (highest precedence)
    pub cli: Option<PathBuf>,
    /// `.env` in the working directory
    pub local: Option<PathBuf>,
    /// Global XDG config
    pub global: Option<PathBuf>,
}

/// Env file discovery
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover all available env files
    ///
    /// # Errors
    ///
    /// Returns an error if `cli_path` is given but does not exist.
    pub fn discover(cli_path: Option<&Path>) -> Result<EnvFiles, ConfigError> {
        let cli = match cli_path {
            Some(path) if path.is_file() => Some(path.to_path_buf()),
            Some(path) => {
                return Err(ConfigError::EnvFileNotFound {
                    path: path.to_path_buf(),
                });
            }
            None => None,
        };

        Ok(EnvFiles {
            cli,
            local: Self::find_local(),
            global: Self::find_global(),
        })
    }

    fn find_local() -> Option<PathBuf> {
        let candidate = std::env::current_dir().ok()?.join(".env");
        candidate.is_file().then_some(candidate)
    }

    fn find_global() -> Option<PathBuf> {
        let candidate = dirs::config_dir()?.join("ldapsync").join("ldapsync.env");
        candidate.is_file().then_some(candidate)
    }
}
