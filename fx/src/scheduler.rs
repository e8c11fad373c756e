//! Periodic background refresh of the cached rate.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use xrate_common::{constants, until_next_boundary};

use crate::service::RateService;

/// When the background refresh fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    /// Time between refreshes.
    pub interval: Duration,
    /// Fire on wall-clock multiples of `interval` (top of the minute for one
    /// minute) instead of counting from spawn time.
    pub align_to_wall_clock: bool,
}

impl RefreshSchedule {
    /// Refresh at the top of every minute.
    pub fn every_minute() -> Self {
        Self {
            interval: constants::refresh_interval(),
            align_to_wall_clock: true,
        }
    }

    /// Refresh every `interval`, first tick one interval after spawn.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            align_to_wall_clock: false,
        }
    }

    /// Replace a zero interval, which the timer cannot tick on, with the default.
    fn non_zero(self) -> Self {
        if !self.interval.is_zero() {
            return self;
        }

        let interval = constants::refresh_interval();
        error!(
            fallback_ms = interval.as_millis() as u64,
            "Refresh interval is zero, using the default interval"
        );
        Self { interval, ..self }
    }

    fn first_tick_in(&self) -> Duration {
        if self.align_to_wall_clock {
            until_next_boundary(xrate_common::now(), self.interval)
        } else {
            self.interval
        }
    }
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::every_minute()
    }
}

/// Spawns the periodic refresh task.
pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Start refreshing `service` on `schedule` until the handle is shut down.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(service: Arc<RateService>, schedule: RefreshSchedule) -> RefreshHandle {
        let schedule = schedule.non_zero();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let first_tick = schedule.first_tick_in();

        info!(
            interval_ms = schedule.interval.as_millis() as u64,
            first_tick_ms = first_tick.as_millis() as u64,
            "Starting scheduled exchange rate refresh"
        );

        let task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(Instant::now() + first_tick, schedule.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        service.handle_scheduled_refresh().await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Refresh scheduler received shutdown");
                        break;
                    }
                }
            }
        });

        RefreshHandle { shutdown_tx, task }
    }
}

/// Handle for stopping the background refresh task.
pub struct RefreshHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the task and wait for it to exit.
    ///
    /// A refresh already in progress is allowed to finish first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;

        if let Err(e) = self.task.await {
            warn!(error = %e, "Refresh scheduler task ended abnormally");
        }

        info!("Scheduled exchange rate refresh stopped");
    }

    /// Check whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
