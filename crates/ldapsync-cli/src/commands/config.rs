use anyhow::Context;
use ldapsync_core::config::{ConfigManager, EnvVars};

use super::CommandOptions;

pub struct Config;

impl Config {
    pub fn execute(env: &EnvVars, options: &CommandOptions<'_>) -> anyhow::Result<()> {
        let config = ConfigManager::from_env(env).context("Invalid configuration")?;

        if options.verbose {
            match options.env_file {
                _ if options.no_env_file => println!("# env files: disabled"),
                Some(path) => println!("# env file: {}", path.display()),
                None => println!("# env files: discovered"),
            }
        }

        let rendered =
            toml::to_string_pretty(&config.redacted()).context("Failed to render configuration")?;
        print!("{rendered}");

        Ok(())
    }
}
