//! Container command configuration.

use super::parse::{var_or, Lookup};
use super::ConfigError;

/// Shell commands backing [`CommandFactory`](crate::command::CommandFactory).
///
/// `{name}` in any command is replaced with the generated container name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Creates the container (required).
    pub create_cmd: String,
    /// Boots it.
    pub start_cmd: Option<String>,
    /// Tears it down.
    pub destroy_cmd: Option<String>,
    /// Prefix for generated names.
    pub name_prefix: String,
}

impl FactoryConfig {
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let create_cmd = lookup("CONTAINER_CREATE_CMD").ok_or_else(|| ConfigError::Missing {
            key: "CONTAINER_CREATE_CMD".into(),
        })?;

        let name_prefix = var_or(lookup, "CONTAINER_NAME_PREFIX", "pool");
        if !name_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Invalid {
                key: "CONTAINER_NAME_PREFIX".into(),
                message: "only ASCII letters, digits, '-' and '_' are allowed".into(),
            });
        }

        Ok(Self {
            create_cmd,
            start_cmd: lookup("CONTAINER_START_CMD"),
            destroy_cmd: lookup("CONTAINER_DESTROY_CMD"),
            name_prefix,
        })
    }
}
