//! Fixed-interval pass scheduling
//!
//! At most one pass runs at a time. Ticks that elapse while a pass is still
//! running are skipped, not queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Create a linked shutdown trigger and listener
#[must_use]
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, Shutdown { rx })
}

/// Requests a cooperative shutdown
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    /// Signal every listener. Triggering twice is harmless.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes a shutdown request
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is requested
    ///
    /// Never resolves if every trigger was dropped without firing.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Runs a pass on a fixed interval until shutdown
pub struct Scheduler;

impl Scheduler {
    /// Call `pass` every `period`, starting one period from now
    ///
    /// Shutdown is checked before each tick. A running pass is awaited to
    /// completion and is expected to observe `shutdown` itself.
    pub async fn run<F, Fut>(period: Duration, mut shutdown: Shutdown, mut pass: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }

            if shutdown.is_triggered() {
                break;
            }
            pass().await;
        }

        debug!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn test_trigger_is_visible_to_clones() {
        let (trigger, shutdown) = shutdown_channel();
        let mut other = shutdown.clone();
        assert!(!shutdown.is_triggered());

        trigger.trigger();
        trigger.trigger();

        assert!(shutdown.is_triggered());
        other.wait().await;
        assert!(other.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let (trigger, shutdown) = shutdown_channel();
        let passes = Arc::new(Mutex::new(0_u32));

        let counter = Arc::clone(&passes);
        Scheduler::run(Duration::from_secs(10), shutdown, move || {
            let counter = Arc::clone(&counter);
            let trigger = trigger.clone();
            async move {
                let mut count = counter.lock().unwrap();
                *count += 1;
                if *count == 3 {
                    trigger.trigger();
                }
            }
        })
        .await;

        assert_eq!(*passes.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_waits_one_period() {
        let (trigger, shutdown) = shutdown_channel();
        let started = Instant::now();
        let first = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&first);
        Scheduler::run(Duration::from_secs(60), shutdown, move || {
            *slot.lock().unwrap() = Some(Instant::now());
            trigger.trigger();
            async {}
        })
        .await;

        let first = first.lock().unwrap().unwrap();
        assert_eq!(first - started, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_pass_coalesces_missed_ticks() {
        let (trigger, shutdown) = shutdown_channel();
        let started = Instant::now();
        let starts = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&starts);
        Scheduler::run(Duration::from_secs(10), shutdown, move || {
            let log = Arc::clone(&log);
            let trigger = trigger.clone();
            async move {
                let count = {
                    let mut starts = log.lock().unwrap();
                    starts.push(Instant::now() - started);
                    starts.len()
                };
                if count == 1 {
                    time::sleep(Duration::from_secs(25)).await;
                }
                if count == 4 {
                    trigger.trigger();
                }
            }
        })
        .await;

        // Ticks at 20s and 30s were missed: one late pass, then back on the grid
        let secs: Vec<u64> = starts.lock().unwrap().iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![10, 35, 40, 50]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_triggered_runs_nothing() {
        let (trigger, shutdown) = shutdown_channel();
        trigger.trigger();
        let passes = Arc::new(Mutex::new(0_u32));

        let counter = Arc::clone(&passes);
        Scheduler::run(Duration::from_secs(1), shutdown, move || {
            *counter.lock().unwrap() += 1;
            async {}
        })
        .await;

        assert_eq!(*passes.lock().unwrap(), 0);
    }
}
