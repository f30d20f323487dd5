//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ll2: Ll2Config,
    pub rocket_launch_api: RocketLaunchApiConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Spacing used when the configured interval is unusable
const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(5);

/// Launch Library 2 upstream
#[derive(Debug, Clone, Deserialize)]
pub struct Ll2Config {
    /// Base prefix every resource path is appended to
    /// e.g., "https://ll.thespacedevs.com/2.3.0"
    pub url_prefix: String,
    /// Minimum spacing between two upstream requests, fractions allowed
    pub request_interval_seconds: f64,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
}

impl Ll2Config {
    pub fn request_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_interval_seconds)
            .ok()
            .filter(|interval| !interval.is_zero())
            .unwrap_or(DEFAULT_REQUEST_INTERVAL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// RocketLaunch.Live feed
#[derive(Debug, Clone, Deserialize)]
pub struct RocketLaunchApiConfig {
    pub base_url: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    /// Number of upcoming launches requested per sync
    pub default_limit: u32,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
}

impl RocketLaunchApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Read cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entry TTL in seconds (default: 300)
    pub ttl_seconds: u64,
    /// Maximum cached entries (default: 10000)
    pub max_items: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (LAUNCHSYNC__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/launchsync.db")?
            .set_default("ll2.url_prefix", "https://ll.thespacedevs.com/2.3.0")?
            .set_default("ll2.request_interval_seconds", 5.0)?
            .set_default("ll2.request_timeout_seconds", 30)?
            .set_default("rocket_launch_api.base_url", "https://fdo.rocketlaunch.live/json")?
            .set_default("rocket_launch_api.default_limit", 10)?
            .set_default("rocket_launch_api.request_timeout_seconds", 30)?
            .set_default("cache.ttl_seconds", 300)?
            .set_default("cache.max_items", 10000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("LAUNCHSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Check values the sync engine cannot run with
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        let interval = self.ll2.request_interval_seconds;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(AppError::Config(
                "ll2.request_interval_seconds must be greater than 0".to_string(),
            ));
        }

        for (key, timeout) in [
            ("ll2.request_timeout_seconds", self.ll2.request_timeout_seconds),
            (
                "rocket_launch_api.request_timeout_seconds",
                self.rocket_launch_api.request_timeout_seconds,
            ),
        ] {
            if timeout == 0 {
                return Err(AppError::Config(format!("{key} must be greater than 0")));
            }
        }

        if self.rocket_launch_api.default_limit == 0 {
            return Err(AppError::Config(
                "rocket_launch_api.default_limit must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("ll2.url_prefix", &self.ll2.url_prefix),
            ("rocket_launch_api.base_url", &self.rocket_launch_api.base_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::Config(format!("{key} must use http or https")));
            }
        }

        Ok(())
    }
}
