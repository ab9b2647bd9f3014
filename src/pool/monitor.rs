//! Background control loop that keeps the pool filled.
//!
//! Every `monitor_period` the loop:
//!
//! 1. evicts error timestamps older than the error window,
//! 2. spawns at most one new worker if the pool has a shortfall, the worker
//!    cap allows it and the error throttle is not engaged,
//! 3. drops workers that finished, were cancelled or timed out.
//!
//! The `workers` list lives on the loop thread's stack and is never touched
//! from anywhere else.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::error::{ErrorQueue, PoolError, PoolResult, WorkerError};
use super::factory::ContainerFactory;
use super::queue::ContainerQueue;
use super::settings::PoolSettings;
use super::worker::{Worker, WorkerCallbacks};
use crate::observability::PoolMetrics;

/// State shared between the loop thread, worker threads and the pool.
struct Shared<F: ContainerFactory> {
    factory: Arc<F>,
    queue: Arc<ContainerQueue<F::Container>>,
    errors: Arc<ErrorQueue>,
    /// Failure times inside the rolling window, oldest first.
    error_timestamps: Mutex<VecDeque<Instant>>,
    settings: PoolSettings,
    metrics: Option<Arc<PoolMetrics>>,
    stop: AtomicBool,
    worker_count: AtomicUsize,
    throttled: AtomicBool,
}

pub struct Monitor<F: ContainerFactory> {
    shared: Arc<Shared<F>>,
    thread: Mutex<Option<JoinHandle<Vec<Worker>>>>,
}

impl<F: ContainerFactory> Monitor<F> {
    /// Start the control loop on its own thread.
    pub(crate) fn start(
        factory: Arc<F>,
        queue: Arc<ContainerQueue<F::Container>>,
        errors: Arc<ErrorQueue>,
        settings: PoolSettings,
        metrics: Option<Arc<PoolMetrics>>,
    ) -> PoolResult<Self> {
        let shared = Arc::new(Shared {
            factory,
            queue,
            errors,
            error_timestamps: Mutex::new(VecDeque::new()),
            settings,
            metrics,
            stop: AtomicBool::new(false),
            worker_count: AtomicUsize::new(0),
            throttled: AtomicBool::new(false),
        });

        let loop_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("pool-monitor".into())
            .spawn(move || Shared::run(loop_shared))
            .map_err(|e| PoolError::Spawn(e.to_string()))?;

        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Stop the loop and cancel every tracked worker.
    ///
    /// With a non-zero `timeout`, also waits up to `timeout` for each
    /// cancelled worker's thread to exit and fails with
    /// [`PoolError::WorkerTimeout`] if any is still running. Calling `stop`
    /// on a stopped monitor is a no-op.
    pub fn stop(&self, timeout: Duration) -> PoolResult<()> {
        self.shared.stop.store(true, Ordering::SeqCst);

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        let workers = handle.join().map_err(|_| PoolError::MonitorPanic)?;
        tracing::info!(cancelled_workers = workers.len(), "pool monitor stopped");

        if timeout.is_zero() {
            return Ok(());
        }

        let mut alive = 0;
        for mut worker in workers {
            if !worker.join_timeout(timeout) {
                tracing::warn!(worker = %worker.id(), "worker thread did not exit in time");
                alive += 1;
            }
        }

        if alive > 0 {
            return Err(PoolError::WorkerTimeout { alive, timeout });
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.shared.stop.load(Ordering::SeqCst)
            && self
                .thread
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .as_ref()
                .is_some_and(|h| !h.is_finished())
    }

    /// Workers currently tracked by the loop.
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count.load(Ordering::SeqCst)
    }

    /// Errors inside the rolling window.
    pub fn recent_error_count(&self) -> usize {
        self.shared.timestamps().len()
    }

    /// Whether the last replenishment decision was suppressed by the throttle.
    pub fn is_throttled(&self) -> bool {
        self.shared.throttled.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.shared.settings
    }
}

impl<F: ContainerFactory> Drop for Monitor<F> {
    fn drop(&mut self) {
        // Let the loop exit on its own; joining here could block a destructor.
        self.shared.stop.store(true, Ordering::SeqCst);
    }
}

impl<F: ContainerFactory> Shared<F> {
    fn run(self: Arc<Self>) -> Vec<Worker> {
        tracing::info!(
            capacity = self.queue.capacity(),
            worker_max = self.settings.worker_max,
            "pool monitor started"
        );

        let mut workers: Vec<Worker> = Vec::new();
        while !self.stop.load(Ordering::SeqCst) {
            self.evict_stale_errors();
            self.create_workers(&mut workers);
            workers.retain(|w| w.check_health());
            self.worker_count.store(workers.len(), Ordering::SeqCst);
            if let Some(metrics) = &self.metrics {
                metrics.update_pool(self.queue.len(), self.queue.capacity(), workers.len());
            }
            thread::sleep(self.settings.monitor_period);
        }

        for worker in &workers {
            worker.cancel();
        }
        self.worker_count.store(0, Ordering::SeqCst);
        workers
    }

    fn evict_stale_errors(&self) {
        let window = self.settings.error_window;
        let mut timestamps = self.timestamps();
        while timestamps
            .front()
            .is_some_and(|t| t.elapsed() > window)
        {
            timestamps.pop_front();
        }
        let count = timestamps.len();
        drop(timestamps);

        if let Some(metrics) = &self.metrics {
            metrics.set_recent_errors(count);
        }
    }

    fn create_workers(self: &Arc<Self>, workers: &mut Vec<Worker>) {
        if self.queue.is_full() || workers.len() >= self.settings.worker_max {
            return;
        }

        let recent = self.timestamps().len();
        let too_many_errors = recent >= self.settings.max_errors_per_hour;
        if let Some(metrics) = &self.metrics {
            metrics.record_throttle_decision(too_many_errors);
        }

        let was_throttled = self.throttled.swap(too_many_errors, Ordering::SeqCst);
        if too_many_errors {
            if !was_throttled {
                tracing::warn!(
                    recent_errors = recent,
                    limit = self.settings.max_errors_per_hour,
                    "too many errors, pausing container creation"
                );
            }
            return;
        }
        if was_throttled {
            tracing::info!(recent_errors = recent, "error rate recovered, resuming container creation");
        }

        let shortfall = self.queue.capacity().saturating_sub(self.queue.len());
        if workers.len() >= shortfall {
            return;
        }

        match Worker::spawn(
            Arc::clone(&self.factory),
            self.callbacks(),
            self.settings.creation_timeout,
        ) {
            Ok(worker) => workers.push(worker),
            Err(e) => tracing::error!(error = %e, "failed to start worker"),
        }
    }

    fn callbacks(self: &Arc<Self>) -> WorkerCallbacks<F::Container> {
        let on_result = Arc::clone(self);
        let on_error = Arc::clone(self);
        WorkerCallbacks {
            on_result: Arc::new(move |container| on_result.on_worker_result(container)),
            on_error: Arc::new(move |err| on_error.on_worker_error(err)),
        }
    }

    /// Runs on a worker thread.
    fn on_worker_result(&self, container: F::Container) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_created();
        }
        self.queue.push(container);
    }

    /// Runs on a worker thread, or on the loop thread for timeouts.
    fn on_worker_error(&self, err: WorkerError) {
        self.timestamps().push_back(Instant::now());
        tracing::error!(worker = %err.worker_id, kind = %err.kind, error = %err.message, "worker error");
        if let Some(metrics) = &self.metrics {
            metrics.inc_worker_error(err.kind.as_str());
        }
        self.errors.push(err);
    }

    fn timestamps(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.error_timestamps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}
