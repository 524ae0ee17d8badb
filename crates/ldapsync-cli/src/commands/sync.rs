use std::time::Duration;

use anyhow::{Context, bail};
use ldapsync_core::config::{ConfigManager, ConfigSource, EnvVars, SyncConfig};
use ldapsync_core::directory::ldap::LdapDialer;
use ldapsync_core::error::SyncError;
use ldapsync_core::schedule::{Scheduler, Shutdown, ShutdownTrigger, shutdown_channel};
use ldapsync_core::store::postgres::PostgresConnector;
use ldapsync_core::sync::{SyncEngine, SyncReport, SyncReporter, error_chain};
use tracing::{error, info};

use super::CommandOptions;

pub struct SyncUsers;

impl SyncUsers {
    pub async fn execute(
        env: &EnvVars,
        interval: Option<Duration>,
        once: bool,
        options: &CommandOptions<'_>,
    ) -> anyhow::Result<()> {
        let config = ConfigManager::from_env(env).context("Invalid configuration")?;

        let period = if once {
            None
        } else {
            interval.or(config.interval)
        };
        if period == Some(Duration::ZERO) {
            bail!("--interval must be positive");
        }

        let (trigger, shutdown) = shutdown_channel();
        Self::install_interrupt_handler(trigger)?;

        let Some(period) = period else {
            let report = Self::run_pass(&config, &shutdown)
                .await
                .context("Sync pass failed")?;
            println!("{}", SyncReporter::generate_summary(&report));
            return Ok(());
        };

        Self::log_outcome(Self::run_pass(&config, &shutdown).await);

        info!(
            interval = %humantime::format_duration(period),
            "Scheduling LDAP sync"
        );
        let source = options.source();
        Scheduler::run(period, shutdown.clone(), || {
            let shutdown = shutdown.clone();
            async move { Self::scheduled_pass(source, &shutdown).await }
        })
        .await;

        Ok(())
    }

    /// Reload the configuration and run one pass
    ///
    /// Failures are logged, the next tick tries again.
    async fn scheduled_pass(source: ConfigSource<'_>, shutdown: &Shutdown) {
        let config = match ConfigManager::load(&source) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %error_chain(&err), "Invalid configuration, skipping this pass");
                return;
            }
        };

        Self::log_outcome(Self::run_pass(&config, shutdown).await);
    }

    async fn run_pass(config: &SyncConfig, shutdown: &Shutdown) -> Result<SyncReport, SyncError> {
        let engine = SyncEngine::new(
            &config.directory.attribute_mapping,
            config.directory.search_settings(),
            Box::new(PostgresConnector::new(config.store.clone())),
            Box::new(LdapDialer::new(config.directory.clone())),
        )?
        .with_shutdown(shutdown.clone());

        engine.run().await
    }

    fn log_outcome(outcome: Result<SyncReport, SyncError>) {
        match outcome {
            Ok(report) => println!("{}", SyncReporter::generate_summary(&report)),
            Err(err) => error!(error = %error_chain(&err), "Sync pass failed"),
        }
    }

    /// First Ctrl+C requests a graceful stop, a second one exits immediately
    fn install_interrupt_handler(trigger: ShutdownTrigger) -> anyhow::Result<()> {
        let mut interrupted = false;
        ctrlc::set_handler(move || {
            if interrupted {
                eprintln!("\nInterrupted again, exiting");
                std::process::exit(130);
            }
            interrupted = true;
            eprintln!("\nInterrupted, stopping after the current step (Ctrl+C again to abort)");
            trigger.trigger();
        })
        .context("Failed to set Ctrl+C handler")
    }
}
