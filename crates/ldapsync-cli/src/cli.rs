use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// One-way LDAP to PostgreSQL user synchronization
///
/// Keeps Greenlight users in step with the directory they signed in with.
/// Settings are read from env files and the process environment.
#[derive(Parser, Debug)]
#[command(name = "ldapsync")]
#[command(long_about = None, version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use specific env file
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "no_env_file")]
    pub env_file: Option<PathBuf>,

    /// Ignore all env files, read the process environment only
    #[arg(long, global = true, conflicts_with = "env_file")]
    pub no_env_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a sync pass, then repeat on an interval if one is configured
    Sync {
        /// Interval between passes, e.g. 30s, 5m or 1h (overrides INTERVAL)
        #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
        interval: Option<Duration>,

        /// Run a single pass and exit, even if INTERVAL is set
        #[arg(long, conflicts_with = "interval")]
        once: bool,
    },

    /// Show the effective configuration with secrets masked
    Config,

    /// Show the effective attribute mapping table
    Mapping,
}
