//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub rating: RatingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Comma separated list of allowed CORS origins
    #[serde(default)]
    pub cors_origins: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2012
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_timeout() -> u64 {
    30
}

/// Which storage backend holds profiles, accounts and actions
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Redis connection URL, required for the redis backend
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Namespace prepended to every stored key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// JSON document loaded into the backend at startup
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_key_prefix() -> String {
    "tollgate".to_string()
}

/// Rating engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RatingConfig {
    /// Maximum number of fallback profiles chased for one lookup
    #[serde(default = "default_max_fallback_depth")]
    pub max_fallback_depth: usize,

    /// Number of shrinking steps used to estimate the max session time
    #[serde(default = "default_max_session_steps")]
    pub max_session_steps: u32,
}

fn default_max_fallback_depth() -> usize {
    8
}

fn default_max_session_steps() -> u32 {
    10
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            max_fallback_depth: default_max_fallback_depth(),
            max_session_steps: default_max_session_steps(),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Run the action scheduler inside this process
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
}

fn default_scheduler_enabled() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
        }
    }
}

/// Log output format
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Self::builder_with_defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with TOLLGATE_ prefix
            .add_source(
                Environment::with_prefix("TOLLGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Self::builder_with_defaults()?
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("TOLLGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 2012)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("server.timeout_secs", 30)?
            .set_default("storage.backend", "memory")?
            .set_default("storage.key_prefix", "tollgate")?
            .set_default("rating.max_fallback_depth", 8)?
            .set_default("rating.max_session_steps", 10)?
            .set_default("scheduler.enabled", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
