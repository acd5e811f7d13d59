//! Background Cleanup Scheduler
//!
//! This module runs the sweep on a recurring timer. It is what keeps the
//! keyspace bounded when expired sessions are never read again.
//!
//! ## Design
//!
//! The scheduler runs as a Tokio task and:
//! 1. Waits one interval on its [`Timer`]
//! 2. Switches to `Sweeping` and runs one full sweep with a fresh cutoff
//! 3. Logs the outcome, success or failure
//! 4. Switches back to `Idle` and arms the timer again
//!
//! ```text
//!            timer fires
//!   ┌──────┐ ───────────> ┌──────────┐
//!   │ Idle │              │ Sweeping │
//!   └──────┘ <─────────── └──────────┘
//!       ▲    sweep resolves (ok or err),
//!       │    timer re-armed
//! ```
//!
//! The next timer is armed only after the previous sweep resolves, so two
//! sweeps never overlap. A failed sweep is logged and the loop keeps going.
//! Shutdown stops the loop between sweeps; a sweep in flight always runs to
//! completion.

use crate::error::{Error, Result};
use crate::expiry::{duration_ms, Clock, SystemClock};
use crate::session::observer::{NoopObserver, SessionObserver};
use crate::sweep::engine::{sweep_cutoff, SweepStats, Sweeper};
use crate::table::RecordTable;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The timer source driving the scheduler.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Completes once `period` has elapsed.
    async fn wait(&self, period: Duration);
}

/// A [`Timer`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn wait(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the timer
    Idle,
    /// A sweep is in flight
    Sweeping,
}

/// One recurring cleanup job: a sweeper plus everything needed to time it,
/// pick its cutoff and report on it.
pub struct CleanupTask<T: ?Sized> {
    sweeper: Sweeper<T>,
    interval: Duration,
    touch_after: Duration,
    clock: Arc<dyn Clock>,
    timer: Arc<dyn Timer>,
    observer: Arc<dyn SessionObserver>,
}

impl<T: ?Sized> Clone for CleanupTask<T> {
    fn clone(&self) -> Self {
        Self {
            sweeper: self.sweeper.clone(),
            interval: self.interval,
            touch_after: self.touch_after,
            clock: Arc::clone(&self.clock),
            timer: Arc::clone(&self.timer),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl<T: RecordTable + ?Sized> CleanupTask<T> {
    /// Creates a task using the system clock, Tokio timers and no observer.
    pub fn new(sweeper: Sweeper<T>, interval: Duration, touch_after: Duration) -> Self {
        Self {
            sweeper,
            interval,
            touch_after,
            clock: Arc::new(SystemClock),
            timer: Arc::new(TokioTimer),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs a single sweep with a cutoff computed now, and reports the result.
    pub async fn run_once(&self) -> Result<SweepStats> {
        let cutoff = sweep_cutoff(self.clock.now_ms(), self.touch_after);

        match self.sweeper.sweep(cutoff).await {
            Ok(stats) => {
                let next_run_secs = self.interval.as_secs_f64();
                info!(
                    cutoff = cutoff,
                    scanned = stats.scanned,
                    deleted = stats.deleted,
                    next_run_secs = next_run_secs,
                    "Expired sessions removed"
                );
                let message = if self.interval.is_zero() {
                    format!(
                        "SessionStore scanned {} rows and removed {} expired sessions.",
                        stats.scanned, stats.deleted
                    )
                } else {
                    format!(
                        "SessionStore scanned {} rows and removed {} expired sessions \
                         running again in {} seconds.",
                        stats.scanned, stats.deleted, next_run_secs
                    )
                };
                self.observer.info(&message);
                Ok(stats)
            }
            Err(e) => {
                let err = Error::from(e);
                warn!(cutoff = cutoff, error = %err, "Unable to remove expired sessions");
                self.observer.error("Unable to remove expired sessions", &err);
                Err(err)
            }
        }
    }
}

impl<T: RecordTable + ?Sized> CleanupTask<T> {
    /// Starts the recurring loop on the current Tokio runtime.
    ///
    /// Returns `None`, and arms nothing, when the interval is zero.
    pub fn spawn(self) -> Option<CleanupScheduler> {
        if self.interval.is_zero() {
            debug!("Cleanup interval is zero, expired session sweeping disabled");
            return None;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let interval = self.interval;

        tokio::spawn(scheduler_loop(self, state_tx, shutdown_rx));

        info!(
            interval_ms = duration_ms(interval),
            "Background session cleanup started"
        );

        Some(CleanupScheduler {
            shutdown_tx,
            state_rx,
        })
    }
}

/// A handle to the running cleanup loop.
///
/// When this handle is dropped, the loop stops.
#[derive(Debug)]
pub struct CleanupScheduler {
    shutdown_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SchedulerState>,
}

impl CleanupScheduler {
    /// Current state of the loop.
    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state_rx.clone()
    }

    /// Stops the loop. A sweep already in flight finishes first.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Background session cleanup stopped");
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main scheduler loop.
async fn scheduler_loop<T: RecordTable + ?Sized>(
    task: CleanupTask<T>,
    state_tx: watch::Sender<SchedulerState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = task.timer.wait(task.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Session cleanup received shutdown signal");
                    return;
                }
                continue;
            }
        }

        state_tx.send_replace(SchedulerState::Sweeping);
        // Errors were already reported by run_once; the loop carries on.
        let _ = task.run_once().await;
        state_tx.send_replace(SchedulerState::Idle);
    }
}
