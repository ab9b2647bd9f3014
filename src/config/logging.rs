//! Logging configuration.

use super::parse::{var_or, Lookup};
use super::ConfigError;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable tracing-subscriber output.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
    /// Output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Load configuration.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: container_pool=debug,hyper=warn
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let format = match var_or(lookup, "LOG_FORMAT", "text").to_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT".into(),
                    message: format!("expected 'text' or 'json', got '{}'", other),
                })
            }
        };

        Ok(Self {
            filter: Self::resolve_log_filter(lookup),
            service_name: var_or(lookup, "SERVICE_NAME", "container_pool"),
            format,
        })
    }

    /// Resolve log filter.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default (info)
    fn resolve_log_filter(lookup: &impl Lookup) -> String {
        // 1. Check LOG_LEVEL first (simple: debug, info, warn, error)
        if let Some(level) = lookup("LOG_LEVEL") {
            let level = level.to_lowercase();
            match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {
                    return format!("container_pool={}", level);
                }
                _ => {
                    // Logging is not up yet, so this goes straight to stderr.
                    eprintln!(
                        "Warning: Invalid LOG_LEVEL '{}', expected: trace, debug, info, warn, error",
                        level
                    );
                }
            }
        }

        // 2. Check RUST_LOG (full tracing filter syntax)
        if let Some(filter) = lookup("RUST_LOG") {
            return filter;
        }

        // 3. Default
        "container_pool=info".to_string()
    }
}
