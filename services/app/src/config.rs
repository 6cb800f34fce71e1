//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Project URL, without a trailing slash.
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub todos_table: String,
    pub http_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Load Backend Settings ---
        let supabase_url = lookup("SUPABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_URL".to_string()))?;
        reqwest::Url::parse(&supabase_url).map_err(|e| {
            ConfigError::InvalidValue("SUPABASE_URL".to_string(), e.to_string())
        })?;
        let supabase_url = supabase_url.trim_end_matches('/').to_string();

        let supabase_anon_key = lookup("SUPABASE_ANON_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_ANON_KEY".to_string()))?;

        let todos_table = lookup("TODOS_TABLE").unwrap_or_else(|| "todos".to_string());

        let timeout_str = lookup("HTTP_TIMEOUT_SECS").unwrap_or_else(|| "30".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "HTTP_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a number of seconds", timeout_str),
            )
        })?;

        // --- Load Logging Settings ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            todos_table,
            http_timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }
}
