//! Configuration module for container_pool.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use container_pool::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Pool size: {}", config.pool.size);
//! ```

mod error;
mod factory;
mod logging;
pub(crate) mod parse;
mod pool;
mod server;

pub use error::ConfigError;
pub use factory::FactoryConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use parse::{env_lookup, parse_duration, Lookup};
pub use pool::PoolConfig;
pub use server::ServerConfig;

use serde::Serialize;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Pool configuration.
    pub pool: PoolConfig,
    /// Container command configuration.
    pub factory: FactoryConfig,
    /// Internal server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&parse::env_lookup)
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        Ok(Self {
            pool: PoolConfig::from_lookup(lookup)?,
            factory: FactoryConfig::from_lookup(lookup)?,
            server: ServerConfig::from_lookup(lookup)?,
            logging: LoggingConfig::from_lookup(lookup)?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Pool size: {}", self.pool.size);
        info!("  Workers: {}", self.pool.worker_max);
        info!("  Creation timeout: {:?}", self.pool.creation_timeout);
        info!("  Monitor period: {:?}", self.pool.monitor_period);
        info!("  Max errors/hour: {}", self.pool.max_errors_per_hour);
        info!("  Create command: {}", self.factory.create_cmd);

        if let Some(ref cmd) = self.factory.start_cmd {
            info!("  Start command: {}", cmd);
        }

        if let Some(ref cmd) = self.factory.destroy_cmd {
            info!("  Destroy command: {}", cmd);
        }

        if let Some(timeout) = self.pool.cleanup_timeout {
            info!("  Cleanup timeout: {:?}", timeout);
        }

        if let Some(ref internal) = self.server.internal_addr {
            info!("  Internal server: {}", internal);
        }
    }

    /// Effective configuration for the /config endpoint.
    pub fn info(&self) -> ConfigInfo {
        ConfigInfo {
            pool_size: self.pool.size.to_string(),
            pool_worker_max: self.pool.worker_max.to_string(),
            pool_creation_timeout: format!("{}s", self.pool.creation_timeout.as_secs_f64()),
            pool_monitor_period: format!("{}ms", self.pool.monitor_period.as_millis()),
            pool_max_errors_per_hour: self.pool.max_errors_per_hour.to_string(),
            pool_cleanup_timeout: self
                .pool
                .cleanup_timeout
                .map(|d| format!("{}s", d.as_secs_f64()))
                .unwrap_or_else(|| "off".into()),
            pool_error_drain_interval: format!(
                "{}s",
                self.pool.error_drain_interval.as_secs_f64()
            ),
            container_create_cmd: self.factory.create_cmd.clone(),
            container_start_cmd: self.factory.start_cmd.clone().unwrap_or_default(),
            container_destroy_cmd: self.factory.destroy_cmd.clone().unwrap_or_default(),
            container_name_prefix: self.factory.name_prefix.clone(),
            internal_addr: self
                .server
                .internal_addr
                .map(|a| a.to_string())
                .unwrap_or_default(),
            log_filter: self.logging.filter.clone(),
            service_name: self.logging.service_name.clone(),
        }
    }
}

/// Effective configuration keyed by environment variable name.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ConfigInfo {
    pub pool_size: String,
    pub pool_worker_max: String,
    pub pool_creation_timeout: String,
    pub pool_monitor_period: String,
    pub pool_max_errors_per_hour: String,
    pub pool_cleanup_timeout: String,
    pub pool_error_drain_interval: String,
    pub container_create_cmd: String,
    pub container_start_cmd: String,
    pub container_destroy_cmd: String,
    pub container_name_prefix: String,
    pub internal_addr: String,
    pub log_filter: String,
    pub service_name: String,
}
