//! Configuration module for apimon
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`APIMON_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use apimon::config::ApimonConfig;
//!
//! let config = ApimonConfig::default();
//! assert_eq!(config.monitor.refresh_interval_seconds, 300);
//!
//! let toml = r#"
//! [monitor]
//! refresh_interval_seconds = 1800
//! "#;
//! let config: ApimonConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.monitor.refresh_interval_seconds, 1800);
//! ```

pub mod error;
pub mod logging;
pub mod monitor;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use monitor::{MonitorConfig, StorageConfig};

// Re-export the status policy from the snapshot module
pub use crate::snapshot::StatusPolicy;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the monitor client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApimonConfig {
    /// Monitor backend and refresh cadence
    pub monitor: MonitorConfig,
    /// Derived status thresholds
    pub status_policy: StatusPolicy,
    /// Local state file
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ApimonConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports APIMON_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("APIMON_BASE_URL") {
            self.monitor.base_url = url;
        }
        if let Ok(interval) = std::env::var("APIMON_REFRESH_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.monitor.refresh_interval_seconds = secs;
            }
        }
        if let Ok(path) = std::env::var("APIMON_STATE_PATH") {
            self.storage.path = path.into();
        }

        if let Ok(level) = std::env::var("APIMON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(path) = std::env::var("APIMON_LOG_FILE") {
            self.logging.file = Some(path.into());
        }
        if let Ok(format) = std::env::var("APIMON_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.monitor.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation {
                field: "monitor.base_url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation {
                field: "monitor.base_url".to_string(),
                message: "URL must start with http:// or https://".to_string(),
            });
        }

        if self.monitor.refresh_interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "monitor.refresh_interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }
        if self.monitor.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "monitor.timeout_seconds".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }
        if self.status_policy.slow_threshold_ms == 0 {
            return Err(ConfigError::Validation {
                field: "status_policy.slow_threshold_ms".to_string(),
                message: "threshold must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
