//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::view::Profile;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Shown on the profile screen
    #[serde(default)]
    pub profile: Profile,
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Create config pointing at a custom base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_overview_ttl")]
    pub overview_ttl_secs: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("fitdash").to_string_lossy().to_string())
        .unwrap_or_else(|| "./fitdash_data".to_string())
}

fn default_overview_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            overview_ttl_secs: default_overview_ttl(),
        }
    }
}

impl StorageConfig {
    pub fn overview_ttl(&self) -> Duration {
        Duration::from_secs(self.overview_ttl_secs)
    }
}

/// Sync poller configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_sync_timeout")]
    pub timeout_secs: u64,

    /// Trigger a (non-forced) sync when the dashboard is opened
    #[serde(default = "default_sync_on_open")]
    pub on_open: bool,

    /// How long a one-shot command waits for the on-open sync before rendering
    #[serde(default = "default_open_wait")]
    pub open_wait_secs: u64,
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_sync_timeout() -> u64 {
    60
}

fn default_sync_on_open() -> bool {
    true
}

fn default_open_wait() -> u64 {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            timeout_secs: default_sync_timeout(),
            on_open: default_sync_on_open(),
            open_wait_secs: default_open_wait(),
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn open_wait(&self) -> Duration {
        Duration::from_secs(self.open_wait_secs)
    }
}

/// Assistant drawer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_overview_timeout")]
    pub overview_timeout_ms: u64,
}

fn default_overview_timeout() -> u64 {
    8000
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            overview_timeout_ms: default_overview_timeout(),
        }
    }
}

impl AssistantConfig {
    pub fn overview_timeout(&self) -> Duration {
        Duration::from_millis(self.overview_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("fitdash").join("config.toml")),
            Some(PathBuf::from("./fitdash.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FITDASH_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(data_dir) = std::env::var("FITDASH_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Ok(level) = std::env::var("FITDASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FITDASH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Fitdash Configuration
#
# Environment variables override these settings:
# - FITDASH_API_URL
# - FITDASH_DATA_DIR
# - FITDASH_LOG_LEVEL
# - FITDASH_LOG_FORMAT

[api]
# Base URL of the dashboard API (including the /api/v1 prefix)
base_url = "http://localhost:8000/api/v1"

# Request timeout in seconds
request_timeout_secs = 30

[storage]
# Directory holding the local store (token, assistant session, overview cache)
data_dir = "~/.local/share/fitdash"

# How long a cached overview stays fresh (seconds)
overview_ttl_secs = 300

[sync]
# Health poll interval while waiting for a refresh (ms)
poll_interval_ms = 3000

# Give up waiting for fresh data after this many seconds
timeout_secs = 60

# Trigger a background refresh when the dashboard opens
on_open = true

# `fitdash open` waits this long for that refresh before rendering
open_wait_secs = 10

[assistant]
# Client-side timeout for the assistant overview request (ms)
overview_timeout_ms = 8000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

[profile]
# Shown on the profile screen; omitted fields render as a placeholder
name = ""
# age = 34
# height_cm = 178
# weight_kg = 70
# resting_hr = 48
"#
    .to_string()
}
