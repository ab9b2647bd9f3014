//! container_pool - pre-warmed pool of system containers.
//!
//! Creating and booting a container takes seconds to minutes, so callers
//! that need one right away take it from a [`Pool`] that keeps a bounded
//! number of started containers ready and refills itself in the background.
//!
//! # Features
//!
//! - **Bounded concurrency**: at most `worker_max` creations in flight
//! - **Creation timeout**: hung creations are abandoned and their output destroyed
//! - **Error throttle**: creation pauses while the hourly error count is at the limit
//! - **Operational surface**: health probes, Prometheus metrics and a lease endpoint
//!
//! # Example
//!
//! ```rust,ignore
//! use container_pool::{CommandFactory, Config, Pool};
//! use std::time::Duration;
//!
//! let config = Config::from_env()?;
//! let pool = Pool::start(CommandFactory::new(config.factory.clone()), config.pool.settings())?;
//!
//! if let Some(container) = pool.get(Some(Duration::from_secs(30))) {
//!     // use the container, then destroy it
//! }
//!
//! pool.cleanup(Duration::ZERO)?;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) with optional "-dirty" suffix
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)" or "0.1.0 (abc12345-dirty)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod command;
pub mod config;
pub mod health;
pub mod logging;
pub mod observability;
pub mod pool;
pub mod server;

// Re-exports for convenience
pub use command::{CommandContainer, CommandFactory};
pub use config::Config;
pub use pool::{
    BoxError, Container, ContainerFactory, Pool, PoolError, PoolResult, PoolSettings, PoolStatus,
    WorkerError, WorkerErrorKind,
};
