//! Pool configuration.

use std::time::Duration;

use super::parse::{var_duration, var_parse, var_required_duration, Lookup};
use super::ConfigError;
use crate::pool::{PoolSettings, DEFAULT_WORKER_MAX, MAX_ERRORS_PER_HOUR, MIN_POOL_SIZE};

/// Pool configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Pool capacity.
    pub size: usize,
    /// Concurrent creation workers.
    pub worker_max: usize,
    /// Per-worker creation budget.
    pub creation_timeout: Duration,
    /// Monitor loop period.
    pub monitor_period: Duration,
    /// Rolling hourly error count that pauses creation.
    pub max_errors_per_hour: usize,
    /// Per-worker join wait on shutdown (None = don't wait).
    pub cleanup_timeout: Option<Duration>,
    /// How often the daemon drains the error queue.
    pub error_drain_interval: Duration,
}

impl PoolConfig {
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let size = var_parse(lookup, "POOL_SIZE", 20usize)?;
        if size < MIN_POOL_SIZE {
            return Err(ConfigError::Invalid {
                key: "POOL_SIZE".into(),
                message: format!("pool size must be at least {}", MIN_POOL_SIZE),
            });
        }

        let worker_max = var_parse(lookup, "POOL_WORKER_MAX", DEFAULT_WORKER_MAX)?;
        if worker_max == 0 {
            return Err(ConfigError::Invalid {
                key: "POOL_WORKER_MAX".into(),
                message: "worker count cannot be zero".into(),
            });
        }

        Ok(Self {
            size,
            worker_max,
            creation_timeout: var_required_duration(lookup, "POOL_CREATION_TIMEOUT", "600s")?,
            monitor_period: var_required_duration(lookup, "POOL_MONITOR_PERIOD", "100ms")?,
            max_errors_per_hour: var_parse(
                lookup,
                "POOL_MAX_ERRORS_PER_HOUR",
                MAX_ERRORS_PER_HOUR,
            )?,
            cleanup_timeout: var_duration(lookup, "POOL_CLEANUP_TIMEOUT", "0")?,
            error_drain_interval: var_required_duration(
                lookup,
                "POOL_ERROR_DRAIN_INTERVAL",
                "10s",
            )?,
        })
    }

    /// Settings handed to the pool.
    pub fn settings(&self) -> PoolSettings {
        PoolSettings::new(self.size)
            .with_worker_max(self.worker_max)
            .with_creation_timeout(self.creation_timeout)
            .with_monitor_period(self.monitor_period)
            .with_max_errors_per_hour(self.max_errors_per_hour)
    }
}
