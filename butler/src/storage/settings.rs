//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Butler settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Device backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Device catalog configuration
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Dependency evaluation configuration
    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

/// Device backend API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the device API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path segment of the read-only status endpoint
    #[serde(default = "default_status_path")]
    pub status_path: String,
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("status_path", &self.status_path)
            .finish()
    }
}

fn default_backend_url() -> String {
    "http://localhost:8123/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_status_path() -> String {
    "states".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            status_path: default_status_path(),
        }
    }
}

/// Device catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Catalog file; the storage layout's catalog.json when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Reload the catalog before every command
    #[serde(default = "default_true")]
    pub reload_per_call: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: None,
            reload_per_call: true,
        }
    }
}

/// Dependency evaluation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Probe dependencies concurrently instead of one after another
    #[serde(default)]
    pub concurrent_probes: bool,
}
