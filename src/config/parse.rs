//! Environment variable parsing utilities.
//!
//! Every loader reads variables through a lookup function so tests can feed
//! a fixed map instead of mutating the process environment.

use std::str::FromStr;
use std::time::Duration;

use super::ConfigError;

/// Source of raw configuration values.
pub trait Lookup: Fn(&str) -> Option<String> {}

impl<T: Fn(&str) -> Option<String>> Lookup for T {}

/// Read from the process environment (empty values count as unset).
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Get a value with default.
pub fn var_or(lookup: &impl Lookup, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse a value with type conversion.
pub fn var_parse<T: FromStr>(lookup: &impl Lookup, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            key: key.into(),
            value: v,
            error: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a value as duration. `None` means disabled ("off" or zero).
pub fn var_duration(
    lookup: &impl Lookup,
    key: &str,
    default: &str,
) -> Result<Option<Duration>, ConfigError> {
    let value = var_or(lookup, key, default);
    parse_duration(&value).map_err(|e| ConfigError::Parse {
        key: key.into(),
        value,
        error: e,
    })
}

/// Parse a duration that must be enabled and non-zero.
pub fn var_required_duration(
    lookup: &impl Lookup,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    var_duration(lookup, key, default)?.ok_or_else(|| ConfigError::Invalid {
        key: key.into(),
        message: "duration cannot be zero or off".into(),
    })
}

/// Parse duration string (e.g., "250ms", "30s", "2m", "1h", "1d", "1w").
/// Returns None for "off" or any zero duration ("0", "0s", "0ms").
pub fn parse_duration(s: &str) -> Result<Option<Duration>, String> {
    let s = s.trim().to_lowercase();

    if s == "off" || s.is_empty() {
        return Ok(None);
    }

    let duration = if let Some(num_str) = s.strip_suffix("ms") {
        Duration::from_millis(parse_number(num_str)?)
    } else {
        let (num_str, multiplier) = match s.chars().last() {
            Some('s') => (&s[..s.len() - 1], 1),
            Some('m') => (&s[..s.len() - 1], 60),
            Some('h') => (&s[..s.len() - 1], 3600),
            Some('d') => (&s[..s.len() - 1], 86400),
            Some('w') => (&s[..s.len() - 1], 86400 * 7),
            // Plain seconds
            _ => (s.as_str(), 1),
        };
        let secs = parse_number(num_str)?
            .checked_mul(multiplier)
            .ok_or_else(|| format!("duration too large: {}", s))?;
        Duration::from_secs(secs)
    };

    Ok(Some(duration).filter(|d| !d.is_zero()))
}

fn parse_number(s: &str) -> Result<u64, String> {
    s.parse().map_err(|_| format!("invalid number: {}", s))
}

/// Lookup over a fixed set of pairs.
#[cfg(test)]
pub(crate) fn map_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}
