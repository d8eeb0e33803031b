//! Configuration loading for ampli-sync.
//!
//! Configuration is loaded from a TOML file (default: `ampli-sync.toml`).
//! Every section and field is optional.

use ampli_sync_client::{HttpConfig, HttpEndpoints, SyncConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sync server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Local database configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Engine configuration.
    #[serde(default)]
    pub sync: SyncSection,
    /// HTTP transport configuration.
    #[serde(default)]
    pub http: HttpSection,
}

/// Sync server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the sync server (default: http://localhost:8080).
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Device identifier sent with push and pull requests.
    pub device_id: Option<String>,
}

/// Local database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file (default: ampli-sync.db).
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    /// Progress units reported as done before the first table (default: 0).
    #[serde(default)]
    pub progress_lead_in: u32,
    /// Tables whose triggers stay active during pull (default: mergeidentity).
    #[serde(default = "default_audit_exempt_tables")]
    pub audit_exempt_tables: Vec<String>,
    /// Drop and re-create triggers around each page (default: true).
    #[serde(default = "default_toggle_triggers")]
    pub toggle_triggers: bool,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpSection {
    /// Per-request timeout in seconds (default: none).
    pub timeout_secs: Option<u64>,
    /// Endpoint paths relative to the server URL.
    #[serde(default)]
    pub endpoints: HttpEndpoints,
}

// Default value functions
fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("ampli-sync.db")
}

fn default_audit_exempt_tables() -> Vec<String> {
    SyncConfig::default().audit_exempt_tables
}

fn default_toggle_triggers() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            device_id: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            progress_lead_in: 0,
            audit_exempt_tables: default_audit_exempt_tables(),
            toggle_triggers: default_toggle_triggers(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Engine settings.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_audit_exempt_tables(self.sync.audit_exempt_tables.iter().cloned())
            .with_trigger_toggling(self.sync.toggle_triggers)
            .with_progress_lead_in(self.sync.progress_lead_in)
    }

    /// Transport settings.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: self.http.timeout_secs.map(Duration::from_secs),
            endpoints: self.http.endpoints.clone(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
