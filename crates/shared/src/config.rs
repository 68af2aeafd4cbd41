//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Statement engine configuration.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Statement engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Upper bound for a single ledger query, in seconds.
    #[serde(default = "default_ledger_timeout")]
    pub ledger_timeout_secs: u64,
    /// Maximum number of ledger queries in flight per statement.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Time-to-live of a cached tenant chart, in seconds.
    #[serde(default = "default_chart_cache_ttl")]
    pub chart_cache_ttl_secs: u64,
    /// Maximum number of tenant charts kept in memory.
    #[serde(default = "default_chart_cache_capacity")]
    pub chart_cache_capacity: u64,
    /// Retries of a whole statement after a transient ledger failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before the first retry, doubled on each further attempt.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// Whether unmapped overhead activity counts toward the overhead grand total.
    #[serde(default)]
    pub include_unmapped_in_overhead: bool,
    /// Decimal places used for presented allocation shares.
    #[serde(default = "default_presentation_decimal_places")]
    pub presentation_decimal_places: u32,
    /// IANA time zone whose calendar date decides whether a month is closed.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ledger_timeout_secs: default_ledger_timeout(),
            max_concurrency: default_max_concurrency(),
            chart_cache_ttl_secs: default_chart_cache_ttl(),
            chart_cache_capacity: default_chart_cache_capacity(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            include_unmapped_in_overhead: false,
            presentation_decimal_places: default_presentation_decimal_places(),
            timezone: default_timezone(),
        }
    }
}

fn default_ledger_timeout() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    8
}

fn default_chart_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_chart_cache_capacity() -> u64 {
    256
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    200
}

fn default_presentation_decimal_places() -> u32 {
    2
}

const fn default_timezone() -> Tz {
    Tz::UTC
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DEALERBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
