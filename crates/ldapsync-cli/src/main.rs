mod cli;
mod commands;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use commands::CommandOptions;
use ldapsync_core::config::{ConfigManager, keys};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = CommandOptions::new(cli.verbose, cli.env_file.as_deref(), cli.no_env_file);

    let env = ConfigManager::load_env(&options.source()).context("Failed to load environment")?;
    logging::init(cli.verbose || env.contains(keys::DEBUG));

    match &cli.command {
        Commands::Sync { interval, once } => {
            commands::SyncUsers::execute(&env, *interval, *once, &options)
                .await
                .context("Failed to execute sync command")?;
        }
        Commands::Config => {
            commands::Config::execute(&env, &options)
                .context("Failed to execute config command")?;
        }
        Commands::Mapping => {
            commands::Mapping::execute(&env).context("Failed to execute mapping command")?;
        }
    }

    Ok(())
}
