//! Internal server configuration.

use std::net::SocketAddr;

use super::parse::Lookup;
use super::ConfigError;

/// Internal server configuration loaded from environment.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Internal server address for /health, /metrics and /status.
    pub internal_addr: Option<SocketAddr>,
}

impl ServerConfig {
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let internal_addr = lookup("INTERNAL_ADDR")
            .map(|s| {
                s.parse::<SocketAddr>().map_err(|e| ConfigError::Parse {
                    key: "INTERNAL_ADDR".into(),
                    value: s,
                    error: format!("{}", e),
                })
            })
            .transpose()?;

        Ok(Self { internal_addr })
    }
}
