//! Pool tuning knobs.

use std::time::Duration;

use super::error::{PoolError, PoolResult};

/// Wall-clock budget for one container creation.
pub const CONTAINER_CREATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Control loop polling interval.
pub const MIN_MONITOR_PERIOD: Duration = Duration::from_millis(100);

/// Rolling error count at which new workers stop being spawned.
pub const MAX_ERRORS_PER_HOUR: usize = 200;

/// Default cap on concurrently running creation workers.
pub const DEFAULT_WORKER_MAX: usize = 5;

/// Window over which errors count toward the throttle.
pub const ERROR_WINDOW: Duration = Duration::from_secs(3600);

/// Smallest pool size accepted.
pub const MIN_POOL_SIZE: usize = 2;

/// Settings for a [`Pool`](super::Pool).
///
/// Defaults match the production constants above; tests shrink the
/// timeouts through the `with_*` methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    pub size: usize,
    pub worker_max: usize,
    pub creation_timeout: Duration,
    pub monitor_period: Duration,
    pub max_errors_per_hour: usize,
    pub error_window: Duration,
}

impl PoolSettings {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            worker_max: DEFAULT_WORKER_MAX,
            creation_timeout: CONTAINER_CREATION_TIMEOUT,
            monitor_period: MIN_MONITOR_PERIOD,
            max_errors_per_hour: MAX_ERRORS_PER_HOUR,
            error_window: ERROR_WINDOW,
        }
    }

    pub fn with_worker_max(mut self, worker_max: usize) -> Self {
        self.worker_max = worker_max;
        self
    }

    pub fn with_creation_timeout(mut self, timeout: Duration) -> Self {
        self.creation_timeout = timeout;
        self
    }

    pub fn with_monitor_period(mut self, period: Duration) -> Self {
        self.monitor_period = period;
        self
    }

    pub fn with_max_errors_per_hour(mut self, max: usize) -> Self {
        self.max_errors_per_hour = max;
        self
    }

    pub fn with_error_window(mut self, window: Duration) -> Self {
        self.error_window = window;
        self
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> PoolResult<()> {
        if self.size < MIN_POOL_SIZE {
            return Err(PoolError::InvalidSize {
                size: self.size,
                min: MIN_POOL_SIZE,
            });
        }
        if self.worker_max == 0 {
            return Err(PoolError::InvalidSetting {
                name: "worker_max",
                message: "must be at least 1".into(),
            });
        }
        if self.monitor_period.is_zero() {
            return Err(PoolError::InvalidSetting {
                name: "monitor_period",
                message: "must be non-zero".into(),
            });
        }
        if self.creation_timeout.is_zero() {
            return Err(PoolError::InvalidSetting {
                name: "creation_timeout",
                message: "must be non-zero".into(),
            });
        }
        Ok(())
    }
}
