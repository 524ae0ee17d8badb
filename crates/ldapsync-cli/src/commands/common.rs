//! Common types and utilities for command execution

use std::path::Path;

use ldapsync_core::config::ConfigSource;

/// Execution options shared by all commands
pub struct CommandOptions<'a> {
    /// Enable debug output
    pub verbose: bool,
    /// Path to a custom env file
    pub env_file: Option<&'a Path>,
    /// Skip loading all env files
    pub no_env_file: bool,
}

impl<'a> CommandOptions<'a> {
    /// Create new command options
    #[must_use]
    pub const fn new(verbose: bool, env_file: Option<&'a Path>, no_env_file: bool) -> Self {
        Self {
            verbose,
            env_file,
            no_env_file,
        }
    }

    /// Where configuration is read from
    #[must_use]
    pub const fn source(&self) -> ConfigSource<'a> {
        ConfigSource {
            env_file: self.env_file,
            no_env_file: self.no_env_file,
        }
    }
}
