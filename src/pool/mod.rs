//! Pre-warmed container pool.
//!
//! The pool keeps up to `size` started containers ready for callers. A
//! background [`Monitor`] replenishes it by running short-lived [`Worker`]s,
//! each of which calls the [`ContainerFactory`] exactly once.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Pool                               │
//! │                                                              │
//! │   get() ◄──── ContainerQueue (bounded FIFO, cap = size) ◄──┐ │
//! │                                                            │ │
//! │   ┌──────────────────── Monitor thread ─────────────────┐  │ │
//! │   │ every period: evict old errors, spawn ≤ 1 worker,   │  │ │
//! │   │ drop finished / timed-out workers                   │  │ │
//! │   └──────┬───────────────┬───────────────┬──────────────┘  │ │
//! │      ┌───▼────┐      ┌───▼────┐      ┌───▼────┐            │ │
//! │      │Worker 1│      │Worker 2│ ...  │Worker N│ (N ≤ max) ─┘ │
//! │      └───┬────┘      └────────┘      └────────┘              │
//! │          └──► factory.create_container() + start()           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Worker failures never reach `get`; they are queued on [`Pool::errors`]
//! and counted toward an hourly throttle that pauses creation when the
//! factory keeps failing.
//!
//! A worker whose factory call hangs is cancelled after the creation
//! timeout and forgotten, but its thread keeps running until the call
//! returns. Whatever it eventually produces is destroyed.

mod error;
mod factory;
mod monitor;
mod queue;
mod settings;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorQueue, PoolError, PoolResult, WorkerError, WorkerErrorKind};
pub use factory::{BoxError, Container, ContainerFactory};
pub use monitor::Monitor;
pub use queue::ContainerQueue;
pub use settings::{
    PoolSettings, CONTAINER_CREATION_TIMEOUT, DEFAULT_WORKER_MAX, ERROR_WINDOW,
    MAX_ERRORS_PER_HOUR, MIN_MONITOR_PERIOD, MIN_POOL_SIZE,
};
pub use worker::Worker;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::observability::PoolMetrics;

/// A bounded supply of ready containers.
pub struct Pool<F: ContainerFactory> {
    queue: Arc<ContainerQueue<F::Container>>,
    errors: Arc<ErrorQueue>,
    monitor: Monitor<F>,
    metrics: Option<Arc<PoolMetrics>>,
}

impl<F: ContainerFactory> Pool<F> {
    /// Create a pool of `size` containers with default settings.
    pub fn new(factory: F, size: usize) -> PoolResult<Self> {
        Self::start(factory, PoolSettings::new(size))
    }

    /// Create a pool and start replenishing it immediately.
    pub fn start(factory: F, settings: PoolSettings) -> PoolResult<Self> {
        Self::spawn(factory, settings, None)
    }

    /// Like [`start`](Self::start), reporting to `metrics`.
    pub fn start_with_metrics(
        factory: F,
        settings: PoolSettings,
        metrics: Arc<PoolMetrics>,
    ) -> PoolResult<Self> {
        Self::spawn(factory, settings, Some(metrics))
    }

    fn spawn(
        factory: F,
        settings: PoolSettings,
        metrics: Option<Arc<PoolMetrics>>,
    ) -> PoolResult<Self> {
        settings.validate()?;

        let queue = Arc::new(ContainerQueue::new(settings.size));
        let errors = Arc::new(ErrorQueue::new());
        let monitor = Monitor::start(
            Arc::new(factory),
            Arc::clone(&queue),
            Arc::clone(&errors),
            settings,
            metrics.clone(),
        )?;

        tracing::info!(capacity = queue.capacity(), "container pool created");

        Ok(Self {
            queue,
            errors,
            monitor,
            metrics,
        })
    }

    /// Take a ready container.
    ///
    /// - `Some(Duration::ZERO)`: return immediately.
    /// - `Some(t)`: wait up to `t`.
    /// - `None`: wait until one is available.
    pub fn get(&self, timeout: Option<Duration>) -> Option<F::Container> {
        match timeout {
            Some(t) if t.is_zero() => self.queue.try_pop(),
            Some(t) => self.queue.pop_timeout(t),
            None => Some(self.queue.pop()),
        }
    }

    /// Stop replenishing and destroy every queued container.
    ///
    /// Returns how many containers were destroyed. A non-zero `timeout` also
    /// waits that long per in-flight worker thread; if any is still alive the
    /// queued containers are destroyed anyway and
    /// [`PoolError::WorkerTimeout`] is returned.
    pub fn cleanup(&self, timeout: Duration) -> PoolResult<usize> {
        let was_running = self.monitor.is_running();
        let stopped = self.monitor.stop(timeout);

        let mut destroyed = 0;
        for container in self.queue.drain() {
            let name = container.name();
            match container.destroy() {
                Ok(()) => destroyed += 1,
                Err(e) => {
                    tracing::error!(container = %name, error = %e, "failed to destroy container")
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.add_cleaned_up(destroyed);
            metrics.update_pool(0, self.capacity(), 0);
        }
        if was_running || destroyed > 0 {
            tracing::info!(destroyed, "container pool cleaned up");
        }

        stopped.map(|()| destroyed)
    }

    /// Ready containers right now. Advisory: a concurrent `get` may take one
    /// before the caller does.
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Failed creation attempts, for the owner to drain.
    pub fn errors(&self) -> &ErrorQueue {
        &self.errors
    }

    /// Workers the monitor is tracking.
    pub fn worker_count(&self) -> usize {
        self.monitor.worker_count()
    }

    /// Errors counted toward the throttle.
    pub fn recent_error_count(&self) -> usize {
        self.monitor.recent_error_count()
    }

    pub fn is_throttled(&self) -> bool {
        self.monitor.is_throttled()
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Point-in-time summary for health checks and the status endpoint.
    pub fn status(&self) -> PoolStatus {
        let settings = self.monitor.settings();
        PoolStatus {
            running: self.is_running(),
            size: self.size(),
            capacity: self.capacity(),
            workers: self.worker_count(),
            worker_max: settings.worker_max,
            recent_errors: self.recent_error_count(),
            max_errors_per_hour: settings.max_errors_per_hour,
            throttled: self.is_throttled(),
            pending_errors: self.errors.len(),
            last_error: self.errors.recent(1).pop(),
        }
    }
}

impl<F: ContainerFactory> Drop for Pool<F> {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup(Duration::ZERO) {
            tracing::error!(error = %e, "container pool cleanup on drop failed");
        }
    }
}

/// Serializable pool snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub running: bool,
    pub size: usize,
    pub capacity: usize,
    pub workers: usize,
    pub worker_max: usize,
    pub recent_errors: usize,
    pub max_errors_per_hour: usize,
    pub throttled: bool,
    /// Errors queued but not yet drained by the owner.
    pub pending_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<WorkerError>,
}
