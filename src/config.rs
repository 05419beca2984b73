use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://lms.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("DB_MAX_CONNECTIONS must be at least 1")]
    NoConnections,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

impl Config {
    /// Reads `DATABASE_URL`, `BIND_ADDR` and `DB_MAX_CONNECTIONS`, falling back to defaults
    /// for unset variables. Set but unparsable values are an error.
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            info!("DATABASE_URL not set, using default: {}", DEFAULT_DATABASE_URL);
            DEFAULT_DATABASE_URL.to_string()
        });
        let bind_addr = parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let max_connections = parse_or(
            &lookup,
            "DB_MAX_CONNECTIONS",
            &DEFAULT_MAX_CONNECTIONS.to_string(),
        )?;

        if max_connections == 0 {
            return Err(ConfigError::NoConnections);
        }

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}
