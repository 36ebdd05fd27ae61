//! Configuration loader for the `cr310-datalogger` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::{env, net::SocketAddr, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_DB_POOL_MAX: u32 = 5;
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_API_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_PORT: u16 = 8000;
pub const DEFAULT_SLOW_REQUEST_MS: u64 = 1000;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Bound on connecting and on acquiring a pooled connection.
    pub db_connect_timeout_secs: u64,

    /// Interface the HTTP server binds to.
    pub api_host: String,

    /// Port the HTTP server binds to.
    pub api_port: u16,

    /// Latency threshold for the ingestion path; slower requests log a warning.
    pub slow_request_ms: u64,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `DB_CONNECT_TIMEOUT_SECS` – connect/acquire timeout (default: 5)
/// - `API_HOST` – bind host (default: 0.0.0.0)
/// - `API_PORT` – bind port (default: 8000)
/// - `SLOW_REQUEST_MS` – slow ingestion threshold in ms (default: 1000)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, DEFAULT_DB_POOL_MAX);
    let db_connect_timeout_secs = parse_env!(
        "DB_CONNECT_TIMEOUT_SECS",
        u64,
        DEFAULT_DB_CONNECT_TIMEOUT_SECS
    );
    let api_host = env::var("API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());
    let api_port = parse_env!("API_PORT", u16, DEFAULT_API_PORT);
    let slow_request_ms = parse_env!("SLOW_REQUEST_MS", u64, DEFAULT_SLOW_REQUEST_MS);

    Ok(Config {
        db_url,
        db_pool_max,
        db_connect_timeout_secs,
        api_host,
        api_port,
        slow_request_ms,
    })
}

impl Config {
    // ---
    /// Configuration with every optional value at its default.
    pub fn with_db_url(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            db_pool_max: DEFAULT_DB_POOL_MAX,
            db_connect_timeout_secs: DEFAULT_DB_CONNECT_TIMEOUT_SECS,
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
            slow_request_ms: DEFAULT_SLOW_REQUEST_MS,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .map_err(|e| anyhow!("Invalid API_HOST/API_PORT: {}", e))
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_ms)
    }

    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                // The scheme's colon is not a password separator
                if !self.db_url[colon_pos..].starts_with("://") {
                    return format!(
                        "{}:****{}",
                        &self.db_url[..colon_pos],
                        &self.db_url[at_pos..]
                    );
                }
            }
        }
        self.db_url.clone()
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL            : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX             : {}", self.db_pool_max);
        tracing::info!("  DB_CONNECT_TIMEOUT_SECS : {}", self.db_connect_timeout_secs);
        tracing::info!("  API_HOST                : {}", self.api_host);
        tracing::info!("  API_PORT                : {}", self.api_port);
        tracing::info!("  SLOW_REQUEST_MS         : {}", self.slow_request_ms);
    }
}
