//! Container pool error types.
//!
//! Two kinds of failure flow out of the pool:
//!
//! - [`PoolError`] is returned synchronously (bad configuration, workers that
//!   refuse to exit during an opted-in shutdown wait).
//! - [`WorkerError`] is data: one record per failed creation attempt, queued
//!   on the [`ErrorQueue`] for the pool owner to drain.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

/// Errors returned synchronously by pool operations.
#[derive(Debug, Clone)]
pub enum PoolError {
    /// The requested pool size is below the supported minimum.
    InvalidSize {
        /// Requested size.
        size: usize,
        /// Smallest accepted size.
        min: usize,
    },

    /// A pool setting other than the size is out of range.
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Worker threads were still alive after the shutdown wait elapsed.
    WorkerTimeout {
        /// Number of worker threads still running.
        alive: usize,
        /// Per-worker wait that was exceeded.
        timeout: Duration,
    },

    /// An OS thread could not be spawned.
    Spawn(String),

    /// The monitor thread panicked.
    MonitorPanic,
}

impl PoolError {
    /// Check if this is a configuration error.
    pub fn is_invalid_config(&self) -> bool {
        matches!(
            self,
            PoolError::InvalidSize { .. } | PoolError::InvalidSetting { .. }
        )
    }

    /// Check if this is a worker timeout error.
    pub fn is_worker_timeout(&self) -> bool {
        matches!(self, PoolError::WorkerTimeout { .. })
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::InvalidSize { size, min } => {
                write!(f, "invalid pool size {}: must be at least {}", size, min)
            }
            PoolError::InvalidSetting { name, message } => {
                write!(f, "invalid pool setting {}: {}", name, message)
            }
            PoolError::WorkerTimeout { alive, timeout } => {
                write!(
                    f,
                    "{} worker thread(s) still alive after {:?}",
                    alive, timeout
                )
            }
            PoolError::Spawn(msg) => write!(f, "failed to spawn thread: {}", msg),
            PoolError::MonitorPanic => write!(f, "monitor thread panicked"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// The stage at which a worker failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerErrorKind {
    /// `create_container` failed.
    Create,
    /// `Container::start` failed.
    Start,
    /// The factory or container panicked.
    Panicked,
    /// The worker exceeded its creation budget and was cancelled.
    Timeout,
}

impl WorkerErrorKind {
    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerErrorKind::Create => "create",
            WorkerErrorKind::Start => "start",
            WorkerErrorKind::Panicked => "panicked",
            WorkerErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for WorkerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed container creation attempt.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerError {
    /// Worker that produced the error.
    pub worker_id: Uuid,
    /// Failure stage.
    pub kind: WorkerErrorKind,
    /// Human-readable cause.
    pub message: String,
    /// Wall-clock time of the failure.
    #[serde(serialize_with = "serialize_unix_secs")]
    pub occurred_at: SystemTime,
}

impl WorkerError {
    pub fn new(worker_id: Uuid, kind: WorkerErrorKind, message: impl Into<String>) -> Self {
        Self {
            worker_id,
            kind,
            message: message.into(),
            occurred_at: SystemTime::now(),
        }
    }

    /// Timeout error for a worker that ran longer than `budget`.
    pub fn timeout(worker_id: Uuid, budget: Duration) -> Self {
        Self::new(
            worker_id,
            WorkerErrorKind::Timeout,
            format!("container creation exceeded {}s", budget.as_secs_f64()),
        )
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == WorkerErrorKind::Timeout
    }
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {} {}: {}", self.worker_id, self.kind, self.message)
    }
}

impl std::error::Error for WorkerError {}

fn serialize_unix_secs<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    serializer.serialize_f64(secs)
}

/// Unbounded queue of worker errors.
///
/// Nothing in the pool consumes this queue. The owner is expected to drain it
/// periodically; under sustained factory failure it grows by one entry per
/// failed attempt until drained.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    inner: Mutex<VecDeque<WorkerError>>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, err: WorkerError) {
        self.lock().push_back(err);
    }

    /// Remove and return the oldest error.
    pub fn pop(&self) -> Option<WorkerError> {
        self.lock().pop_front()
    }

    /// Remove and return every queued error, oldest first.
    pub fn drain(&self) -> Vec<WorkerError> {
        self.lock().drain(..).collect()
    }

    /// Copy of the most recent `n` errors without removing them.
    pub fn recent(&self, n: usize) -> Vec<WorkerError> {
        let guard = self.lock();
        let skip = guard.len().saturating_sub(n);
        guard.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<WorkerError>> {
        // A panic while holding this lock cannot leave the deque half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
