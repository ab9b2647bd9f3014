//! Single-shot container creation worker.
//!
//! Each [`Worker`] owns one OS thread that calls the factory once, starts the
//! resulting container and hands it to the monitor. Cancellation is
//! cooperative: the factory call is never interrupted, the cancelled flag only
//! decides what happens to the container once the call returns.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::error::{PoolError, PoolResult, WorkerError, WorkerErrorKind};
use super::factory::{Container, ContainerFactory};

/// Receives a freshly started container.
pub(crate) type ResultCallback<C> = Arc<dyn Fn(C) + Send + Sync>;

/// Receives a failed creation attempt.
pub(crate) type ErrorCallback = Arc<dyn Fn(WorkerError) + Send + Sync>;

/// How a worker reports back to its owner.
pub(crate) struct WorkerCallbacks<C> {
    pub on_result: ResultCallback<C>,
    pub on_error: ErrorCallback,
}

impl<C> Clone for WorkerCallbacks<C> {
    fn clone(&self) -> Self {
        Self {
            on_result: Arc::clone(&self.on_result),
            on_error: Arc::clone(&self.on_error),
        }
    }
}

/// Completion state, guarded by one lock so that cancellation and
/// completion never interleave.
#[derive(Debug, Default)]
struct WorkerState {
    started_at: Option<Instant>,
    cancelled: bool,
    completed: bool,
}

pub struct Worker {
    id: Uuid,
    state: Arc<Mutex<WorkerState>>,
    handle: Option<JoinHandle<()>>,
    timeout: Duration,
    on_error: ErrorCallback,
}

impl Worker {
    /// Spawn a worker thread that creates one container.
    pub(crate) fn spawn<F>(
        factory: Arc<F>,
        callbacks: WorkerCallbacks<F::Container>,
        timeout: Duration,
    ) -> PoolResult<Self>
    where
        F: ContainerFactory,
    {
        let id = Uuid::new_v4();
        let state = Arc::new(Mutex::new(WorkerState::default()));
        let on_error = Arc::clone(&callbacks.on_error);

        let thread_state = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name(format!("pool-worker-{}", &id.simple().to_string()[..8]))
            .spawn(move || run(id, &*factory, &thread_state, &callbacks))
            .map_err(|e| PoolError::Spawn(e.to_string()))?;

        tracing::debug!(worker = %id, "worker spawned");

        Ok(Self {
            id,
            state,
            handle: Some(handle),
            timeout,
            on_error,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Mark the worker cancelled.
    ///
    /// Returns `false` if the worker had already completed; its container has
    /// then already been delivered or destroyed.
    pub fn cancel(&self) -> bool {
        let mut state = lock(&self.state);
        if state.completed {
            return false;
        }
        state.cancelled = true;
        true
    }

    /// Report whether the worker should stay tracked.
    ///
    /// A worker past its creation budget is cancelled here and a timeout
    /// error is reported through the error callback.
    pub fn check_health(&self) -> bool {
        let mut state = lock(&self.state);
        if !self.is_alive() || state.cancelled || state.completed {
            return false;
        }
        let Some(started_at) = state.started_at else {
            return true;
        };
        if started_at.elapsed() <= self.timeout {
            return true;
        }

        // Not completed (checked above), so the cancel takes effect.
        state.cancelled = true;
        drop(state);

        tracing::warn!(
            worker = %self.id,
            timeout_secs = self.timeout.as_secs_f64(),
            "worker timed out, cancelling"
        );
        (self.on_error)(WorkerError::timeout(self.id, self.timeout));
        false
    }

    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait up to `timeout` for the worker thread to exit.
    ///
    /// Returns `true` once the thread has been joined.
    pub fn join_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match &self.handle {
                None => return true,
                Some(handle) if handle.is_finished() => {
                    if let Some(handle) = self.handle.take() {
                        // Panics are caught inside `run`; nothing to propagate.
                        let _ = handle.join();
                    }
                    return true;
                }
                Some(_) => {}
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            thread::sleep(remaining.min(Duration::from_millis(10)));
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("state", &*lock(&self.state))
            .field("alive", &self.is_alive())
            .finish()
    }
}

fn lock(state: &Mutex<WorkerState>) -> MutexGuard<'_, WorkerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Worker thread body.
fn run<F>(
    id: Uuid,
    factory: &F,
    state: &Mutex<WorkerState>,
    callbacks: &WorkerCallbacks<F::Container>,
) where
    F: ContainerFactory,
{
    lock(state).started_at = Some(Instant::now());

    let container = match create_and_start(id, factory) {
        Ok(container) => Some(container),
        Err(err) => {
            tracing::warn!(worker = %id, kind = %err.kind, error = %err.message, "container creation failed");
            (callbacks.on_error)(err);
            None
        }
    };

    let mut guard = lock(state);
    guard.completed = true;
    let Some(container) = container else {
        return;
    };

    if guard.cancelled {
        drop(guard);
        let name = container.name();
        tracing::info!(worker = %id, container = %name, "worker was cancelled, destroying container");
        if let Err(e) = container.destroy() {
            tracing::error!(worker = %id, container = %name, error = %e, "failed to destroy cancelled container");
        }
    } else {
        // Delivered under the lock: once `cancel` can observe completion the
        // container is already in the pool.
        (callbacks.on_result)(container);
    }
}

/// Create and boot one container, converting every failure into a
/// [`WorkerError`]. A container whose start fails is destroyed here.
fn create_and_start<F>(id: Uuid, factory: &F) -> Result<F::Container, WorkerError>
where
    F: ContainerFactory,
{
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut container = factory
            .create_container()
            .map_err(|e| WorkerError::new(id, WorkerErrorKind::Create, e.to_string()))?;

        if let Err(e) = container.start(true) {
            let name = container.name();
            if let Err(destroy_err) = container.destroy() {
                tracing::error!(worker = %id, container = %name, error = %destroy_err, "failed to destroy container after start failure");
            }
            return Err(WorkerError::new(id, WorkerErrorKind::Start, e.to_string()));
        }
        Ok(container)
    }));

    attempt.unwrap_or_else(|payload| {
        Err(WorkerError::new(
            id,
            WorkerErrorKind::Panicked,
            panic_message(payload.as_ref()),
        ))
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
