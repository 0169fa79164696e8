//! Server configuration
//!
//! Defaults suit a local single-file deployment; every field can be
//! overridden from the environment.

use chrono::Duration;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
pub const ENV_REQUIRE_AUTH: &str = "TODO_REQUIRE_AUTH";
pub const ENV_EXPIRY_HOURS: &str = "TODO_EXPIRY_HOURS";

const DEFAULT_DB_FILE: &str = "todo.db";
const DEFAULT_EXPIRY_HOURS: i64 = 24;
/// One hundred years
const MAX_EXPIRY_HOURS: i64 = 100 * 365 * 24;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be true or false, got '{value}'")]
    InvalidFlag { key: &'static str, value: String },
    #[error("{key} must be a number of hours between 1 and 876000, got '{value}'")]
    InvalidHours { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// SQLite file, or `:memory:`
    pub db_path: PathBuf,
    /// Reject callers without an identity. When off, signed-out callers share
    /// one anonymous list.
    pub require_auth: bool,
    /// How far ahead `expired_at` is stamped when an item becomes pending
    pub expiry_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            require_auth: true,
            expiry_window: Duration::hours(DEFAULT_EXPIRY_HOURS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_REQUIRE_AUTH) {
            config.require_auth = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidFlag { key: ENV_REQUIRE_AUTH, value }),
            };
        }

        if let Some(value) = lookup(ENV_EXPIRY_HOURS) {
            config.expiry_window = value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=MAX_EXPIRY_HOURS).contains(h))
                .and_then(Duration::try_hours)
                .ok_or_else(|| ConfigError::InvalidHours { key: ENV_EXPIRY_HOURS, value: value.clone() })?;
        }

        Ok(config)
    }

    /// In-memory database, auth required. Handy for tests and demos.
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(crate::repository::IN_MEMORY),
            ..Self::default()
        }
    }
}
