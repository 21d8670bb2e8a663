//! The click loop.
//!
//! [`ClickController`] owns the configuration, the run state and at most one
//! worker thread. Configuration is published copy-on-write: every update
//! swaps in a whole new [`ClickConfig`], and the worker takes one snapshot
//! at the top of each iteration, so a change mid-run (including a new
//! position) applies in full from the next click.

use crate::backend::InputBackend;
use crate::config::ClickConfig;
use crate::error::{ClickerError, Result};
use crate::position::Position;
use crate::status::{StatusEvent, StatusSender};
use crate::strategy::Strategy;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// Result of a successful [`ClickController::start`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A run was already active; nothing changed.
    AlreadyRunning,
}

/// Thread-safe start/stop handle over the click loop.
///
/// Cloning yields another handle to the same controller, which is how the
/// hotkey listener and the host share it.
#[derive(Clone)]
pub struct ClickController {
    inner: Arc<Inner>,
}

struct Inner {
    config: RwLock<Arc<ClickConfig>>,
    backend: Arc<dyn InputBackend>,
    running: AtomicBool,
    stop_requested: AtomicBool,
    clicks_done: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
    status: StatusSender,
}

impl ClickController {
    pub fn new(backend: Arc<dyn InputBackend>, config: ClickConfig, status: StatusSender) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(Arc::new(config)),
                backend,
                running: AtomicBool::new(false),
                stop_requested: AtomicBool::new(false),
                clicks_done: AtomicU64::new(0),
                worker: Mutex::new(None),
                status,
            }),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<ClickConfig> {
        self.inner.snapshot()
    }

    pub fn set_config(&self, config: ClickConfig) {
        *self.inner.config.write() = Arc::new(config);
    }

    /// Applies `f` to a copy of the current config and publishes the result.
    pub fn update_config(&self, f: impl FnOnce(&mut ClickConfig)) {
        let mut guard = self.inner.config.write();
        let mut next = ClickConfig::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    /// Sets the click target. During a run it applies from the next iteration.
    pub fn set_position(&self, position: Position) {
        self.update_config(|c| c.position = Some(position));
        info!(%position, "click position set");
        self.inner.publish(StatusEvent::PositionSet(position));
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn clicks_done(&self) -> u64 {
        self.inner.clicks_done.load(Ordering::Acquire)
    }

    /// Starts a run on a new worker thread.
    ///
    /// No-op while a run is active, including a run that has been asked to
    /// stop but has not reached its next check yet. Fails without starting
    /// if no position is configured or the config is invalid.
    pub fn start(&self) -> Result<StartOutcome> {
        // Held across the check and the spawn so two racing starts cannot
        // both store a worker handle.
        let mut worker = self.inner.worker.lock();

        if self.is_running() {
            debug!("start ignored, click loop already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let config = self.config();
        let checked = if config.position.is_none() {
            Err(ClickerError::NoPosition)
        } else {
            config.validate()
        };
        if let Err(e) = checked {
            warn!(error = %e, "refusing to start");
            self.inner.publish(StatusEvent::Error(e.to_string()));
            return Err(e);
        }

        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(StartOutcome::AlreadyRunning);
        }
        self.inner.clicks_done.store(0, Ordering::Release);
        self.inner.stop_requested.store(false, Ordering::Release);

        // Reap the previous run's thread, which has already cleared `running`.
        if let Some(previous) = worker.take() {
            let _ = previous.join();
        }

        self.inner.publish(StatusEvent::Started);
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("click-loop".to_string())
            .spawn(move || inner.run());

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!(
                    method = %config.method,
                    humanize = config.humanize,
                    budget = config.click_budget,
                    interval_ms = config.interval.as_millis() as u64,
                    "click loop started"
                );
                Ok(StartOutcome::Started)
            }
            Err(e) => {
                self.inner.running.store(false, Ordering::Release);
                error!(error = %e, "failed to spawn click loop");
                self.inner
                    .publish(StatusEvent::Error(format!("cannot start worker: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Asks the running loop to exit at its next iteration boundary.
    ///
    /// Idempotent. An in-flight click or sleep is not interrupted.
    pub fn stop(&self) {
        let already_requested = self.inner.stop_requested.swap(true, Ordering::AcqRel);
        if self.is_running() && !already_requested {
            info!("stop requested");
            self.inner.publish(StatusEvent::Stopped);
        }
    }

    /// Blocks until the current worker, if any, has exited.
    pub fn join(&self) {
        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("click loop thread panicked outside the loop body");
            }
        }
    }
}

impl Inner {
    fn snapshot(&self) -> Arc<ClickConfig> {
        Arc::clone(&*self.config.read())
    }

    fn publish(&self, event: StatusEvent) {
        if self.status.send(event).is_err() {
            trace!("status receiver dropped");
        }
    }

    fn should_continue(&self, config: &ClickConfig) -> bool {
        if self.stop_requested.load(Ordering::Acquire) {
            return false;
        }
        match config.budget() {
            Some(budget) => self.clicks_done.load(Ordering::Acquire) < budget,
            None => true,
        }
    }

    /// Worker entry point. Never panics out and always returns to idle.
    fn run(&self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.click_until_done()));

        let fatal = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => {
                Some(ClickerError::loop_fatal(panic_message(payload.as_ref())).to_string())
            }
        };
        if let Some(message) = fatal {
            error!(error = %message, "click loop aborted");
            self.publish(StatusEvent::Error(message));
        }

        self.running.store(false, Ordering::Release);
        info!(clicks = self.clicks_done.load(Ordering::Acquire), "click loop finished");
        self.publish(StatusEvent::Finished);
    }

    fn click_until_done(&self) -> Result<()> {
        let mut rng = rand::thread_rng();

        loop {
            let config = self.snapshot();
            if !self.should_continue(&config) {
                return Ok(());
            }

            let target = config.position.ok_or(ClickerError::NoPosition)?;
            let strategy = Strategy::select(config.method, config.humanize);
            let clicked = strategy.click(
                self.backend.as_ref(),
                target,
                config.target_window,
                &config.jitter,
                &mut rng,
            );

            let done = if clicked {
                self.clicks_done.fetch_add(1, Ordering::AcqRel) + 1
            } else {
                self.clicks_done.load(Ordering::Acquire)
            };
            self.publish(StatusEvent::Progress {
                done,
                budget: config.budget(),
            });

            let delay = if config.randomize_interval {
                config.jitter.sample_interval(config.interval, &mut rng)?
            } else {
                config.interval
            };
            trace!(delay_ms = delay.as_millis() as u64, "sleeping until next click");
            thread::sleep(delay);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
