use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};
use watchcast_config::PathManager;
use watchcast_core::{CycleOptions, CycleRunner, StoreProvider};
use super::{build_runner, load_config};

/// Fixed-interval driver for the check cycle.
///
/// A cycle is always awaited to completion before the next tick is taken, so
/// two cycles never overlap. A cycle that outlasts the interval pushes the
/// following tick back instead of queueing a burst.
pub struct Scheduler<P: StoreProvider> {
    runner: CycleRunner<P>,
    interval: Duration,
    run_on_startup: bool,
}

impl<P: StoreProvider> Scheduler<P> {
    pub fn new(runner: CycleRunner<P>, interval: Duration, run_on_startup: bool) -> Self {
        Self {
            runner,
            interval,
            run_on_startup,
        }
    }

    /// Run until `shutdown` resolves. Shutdown is observed between cycles.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let now = Instant::now();
        let start = if self.run_on_startup {
            now
        } else {
            now.checked_add(self.interval).unwrap_or_else(|| far_future(now))
        };
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut cycles = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(operation = "scheduler_stopping", cycles, "Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    cycles += 1;
                    self.run_once(cycles).await;
                }
            }
        }

        cycles
    }

    async fn run_once(&self, cycle: usize) {
        match self.runner.run_cycle(CycleOptions::default()).await {
            Ok(report) => {
                info!(
                    operation = "scheduled_check_complete",
                    cycle,
                    fetched = report.fetched,
                    delivered = report.delivery.committed(),
                    failed = report.delivery.failed(),
                    "Scheduled check finished"
                );
            }
            Err(e) => {
                // The next tick tries again
                error!(operation = "scheduled_check_error", cycle, error = %e, "Scheduled check failed");
            }
        }
    }
}

// Roughly 30 years, the same ceiling tokio uses for timers that never fire
fn far_future(now: Instant) -> Instant {
    now + Duration::from_secs(86400 * 365 * 30)
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            error!(error = %e, "Failed to register SIGTERM handler, only Ctrl-C will stop the scheduler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = term.recv() => info!("Received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl-C");
}

pub async fn run_scheduler(interval_override: Option<u64>, no_startup_check: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut config = load_config(&paths)?;
    if let Some(secs) = interval_override {
        config.scheduler.check_interval_secs = secs;
    }
    let runner = build_runner(&config, &paths)?;
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

    let run_on_startup = config.scheduler.run_on_startup && !no_startup_check;
    info!(
        operation = "scheduler_started",
        interval_secs = config.scheduler.check_interval_secs,
        lookback_hours = config.scheduler.lookback_hours,
        retention_days = config.history.retention_days,
        run_on_startup,
        history_file = %paths.history_file().display(),
        "Scheduler started"
    );
    output.info(format!(
        "Checking every {}s (Ctrl-C to stop)",
        config.scheduler.check_interval_secs
    ));

    let scheduler = Scheduler::new(runner, config.check_interval(), run_on_startup);
    let cycles = scheduler.run_until(shutdown_signal()).await;

    output.success(format!("Stopped after {} check(s)", cycles));
    Ok(())
}
