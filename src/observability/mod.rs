//! Observability for the container pool.
//!
//! # Prometheus Metrics
//!
//! ```rust,ignore
//! use container_pool::observability::PoolMetrics;
//!
//! let metrics = Arc::new(PoolMetrics::new()?);
//! let pool = Pool::start_with_metrics(factory, settings, Arc::clone(&metrics))?;
//! println!("{}", metrics.export());
//! ```
//!
//! Structured logging lives in [`crate::logging`].

pub mod metrics;

pub use metrics::PoolMetrics;
