//! Monitor backend and refresh cadence settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the monitor backend lives and how often the snapshot is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Base URL of the monitor backend (no trailing slash needed)
    pub base_url: String,
    /// Seconds between scheduled full refreshes
    pub refresh_interval_seconds: u64,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Flatten the parameter set into request headers
    pub forward_parameters: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            refresh_interval_seconds: 300,
            timeout_seconds: 10,
            forward_parameters: true,
        }
    }
}

impl MonitorConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Location of the durable local state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: std::path::PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: std::path::PathBuf::from("apimon-state.json"),
        }
    }
}
