//! Runtime settings from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::SettingsError;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_SCHEMA: &str = "blog";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    /// Postgres URL. When absent the service runs on the in-memory gateway.
    pub database_url: Option<String>,
    pub schema: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub max_body_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let schema = get("BLOG_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        if !is_identifier(&schema) {
            return Err(SettingsError::Invalid {
                key: "BLOG_SCHEMA",
                message: format!("'{}' is not a plain identifier", schema),
            });
        }

        let bind_addr = parse::<SocketAddr>(get("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;
        let max_connections = parse::<u32>(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", Some(DEFAULT_MAX_CONNECTIONS))?;
        if max_connections == 0 {
            return Err(SettingsError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                message: "must be greater than zero".into(),
            });
        }
        let max_body_bytes = parse::<usize>(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", Some(DEFAULT_MAX_BODY_BYTES))?;
        if max_body_bytes == 0 {
            return Err(SettingsError::Invalid {
                key: "MAX_BODY_BYTES",
                message: "must be greater than zero".into(),
            });
        }

        Ok(Settings {
            database_url: get("DATABASE_URL"),
            schema,
            bind_addr,
            max_connections,
            max_body_bytes,
        })
    }
}

fn parse<T>(raw: Option<String>, key: &'static str, default: Option<T>) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(s) => s.parse().map_err(|e: T::Err| SettingsError::Invalid {
            key,
            message: format!("'{}': {}", s, e),
        }),
        None => default.ok_or_else(|| SettingsError::Invalid {
            key,
            message: "no default".into(),
        }),
    }
}

/// Lowercase letters, digits and underscores, not starting with a digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
