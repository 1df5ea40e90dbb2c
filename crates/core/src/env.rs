//! Environment variable parsing shared by the `from_env` constructors.

use std::str::FromStr;

use crate::error::CoreError;

/// Read `key` and parse it, falling back to `default` when unset.
///
/// A set-but-unparseable value is a [`CoreError::Validation`] so that
/// misconfiguration fails at startup instead of silently using the default.
pub fn parse_or<T>(key: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

/// Parse a raw value for `key`, naming the key in the error.
pub fn parse_value<T>(key: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| CoreError::Validation(format!("{key} has invalid value '{raw}': {e}")))
}
