//! Prometheus metrics for the container pool.

use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

/// Prometheus registry with all pool metrics.
pub struct PoolMetrics {
    registry: Registry,

    /// Containers delivered into the pool
    pub containers_created_total: Counter,

    /// Containers destroyed by cleanup
    pub containers_cleaned_up_total: Counter,

    /// Failed creation attempts by failure stage
    pub worker_errors_total: CounterVec,

    /// Replenishment decisions, tagged by whether the error throttle was engaged
    pub error_throttle_total: CounterVec,

    /// Errors inside the rolling throttle window
    pub recent_errors: Gauge,

    /// Ready containers
    pub pool_size: Gauge,

    /// Pool capacity
    pub pool_capacity: Gauge,

    /// Workers tracked by the monitor
    pub workers_active: Gauge,
}

impl PoolMetrics {
    /// Create a new registry with all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let containers_created_total = Counter::new(
            "container_pool_containers_created_total",
            "Containers created and delivered into the pool",
        )?;
        registry.register(Box::new(containers_created_total.clone()))?;

        let containers_cleaned_up_total = Counter::new(
            "container_pool_containers_cleaned_up_total",
            "Containers destroyed during pool cleanup",
        )?;
        registry.register(Box::new(containers_cleaned_up_total.clone()))?;

        let worker_errors_total = CounterVec::new(
            Opts::new(
                "container_pool_worker_errors_total",
                "Failed container creation attempts",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(worker_errors_total.clone()))?;

        let error_throttle_total = CounterVec::new(
            Opts::new(
                "container_pool_error_throttle_total",
                "Worker creation decisions by throttle state",
            ),
            &["throttled"],
        )?;
        registry.register(Box::new(error_throttle_total.clone()))?;

        let recent_errors = Gauge::new(
            "container_pool_recent_errors",
            "Worker errors in the last hour",
        )?;
        registry.register(Box::new(recent_errors.clone()))?;

        let pool_size = Gauge::new("container_pool_size", "Ready containers in the pool")?;
        registry.register(Box::new(pool_size.clone()))?;

        let pool_capacity = Gauge::new("container_pool_capacity", "Pool capacity")?;
        registry.register(Box::new(pool_capacity.clone()))?;

        let workers_active = Gauge::new(
            "container_pool_workers_active",
            "Container creation workers in flight",
        )?;
        registry.register(Box::new(workers_active.clone()))?;

        Ok(Self {
            registry,
            containers_created_total,
            containers_cleaned_up_total,
            worker_errors_total,
            error_throttle_total,
            recent_errors,
            pool_size,
            pool_capacity,
            workers_active,
        })
    }

    pub fn inc_created(&self) {
        self.containers_created_total.inc();
    }

    pub fn add_cleaned_up(&self, count: usize) {
        self.containers_cleaned_up_total.inc_by(count as f64);
    }

    pub fn inc_worker_error(&self, kind: &str) {
        self.worker_errors_total.with_label_values(&[kind]).inc();
    }

    pub fn record_throttle_decision(&self, throttled: bool) {
        let label = if throttled { "true" } else { "false" };
        self.error_throttle_total.with_label_values(&[label]).inc();
    }

    pub fn set_recent_errors(&self, count: usize) {
        self.recent_errors.set(count as f64);
    }

    /// Update occupancy gauges.
    pub fn update_pool(&self, size: usize, capacity: usize, workers: usize) {
        self.pool_size.set(size as f64);
        self.pool_capacity.set(capacity as f64);
        self.workers_active.set(workers as f64);
    }

    /// Export metrics in Prometheus text format.
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Get the Prometheus registry (for custom metrics).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for PoolMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolMetrics").finish_non_exhaustive()
    }
}
