//! Health checker implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{CheckResult, HealthDetails, HealthStatus, Outcome, ProbeType};
use crate::pool::PoolStatus;

/// Health checker for Kubernetes probes.
///
/// Stateless apart from the startup latch: every check evaluates a fresh
/// [`PoolStatus`] snapshot.
pub struct HealthChecker {
    /// Set once the pool has held a container
    startup_complete: AtomicBool,
    /// Process start time for uptime calculation
    start_time: Instant,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            startup_complete: AtomicBool::new(false),
            start_time: Instant::now(),
        }
    }

    /// Check if startup is complete.
    pub fn is_startup_complete(&self) -> bool {
        self.startup_complete.load(Ordering::Relaxed)
    }

    /// Perform health check based on probe type.
    pub fn check(&self, probe: ProbeType, pool: &PoolStatus) -> HealthStatus {
        if pool.size > 0 {
            self.startup_complete.store(true, Ordering::Relaxed);
        }

        match probe {
            ProbeType::Liveness => self.check_liveness(pool),
            ProbeType::Readiness => self.check_readiness(pool),
            ProbeType::Startup => self.check_startup(pool),
        }
    }

    /// Liveness: the monitor loop is running.
    fn check_liveness(&self, pool: &PoolStatus) -> HealthStatus {
        HealthStatus::from_checks(ProbeType::Liveness, vec![monitor_check(pool)])
    }

    /// Readiness: a container can be handed out right now. A throttled
    /// pool only warns; the containers already queued still serve.
    fn check_readiness(&self, pool: &PoolStatus) -> HealthStatus {
        let mut checks = vec![monitor_check(pool)];
        if pool.running {
            checks.push(CheckResult::require(
                "containers_ready",
                pool.size > 0,
                Outcome::Fail,
                || format!("0/{} ready, {} workers", pool.capacity, pool.workers),
            ));
            checks.push(CheckResult::require(
                "error_throttle",
                !pool.throttled,
                Outcome::Warn,
                || {
                    format!(
                        "{}/{} errors in the last hour",
                        pool.recent_errors, pool.max_errors_per_hour
                    )
                },
            ));
        }

        HealthStatus::from_checks(ProbeType::Readiness, checks)
            .with_details(|| self.details(pool))
    }

    /// Startup: the pool has produced its first container.
    fn check_startup(&self, pool: &PoolStatus) -> HealthStatus {
        let first = CheckResult::require(
            "first_container",
            self.is_startup_complete(),
            Outcome::Pending,
            || "Waiting for first container".into(),
        );
        HealthStatus::from_checks(ProbeType::Startup, vec![first])
            .with_details(|| self.details(pool))
    }

    fn details(&self, pool: &PoolStatus) -> HealthDetails {
        HealthDetails {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
            pool_size: pool.size,
            pool_capacity: pool.capacity,
            workers: pool.workers,
            recent_errors: pool.recent_errors,
        }
    }

    /// Get process uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn monitor_check(pool: &PoolStatus) -> CheckResult {
    CheckResult::require("monitor_running", pool.running, Outcome::Fail, || {
        "Monitor stopped".into()
    })
}
