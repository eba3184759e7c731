//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControllerConfig {
    /// Identity of the Alertmanager instance this controller serves.
    pub instance: InstanceIdentity,

    /// Reload endpoint settings.
    pub reload: ReloadConfig,

    /// Bundle source settings.
    pub source: SourceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Static identity of the controller instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct InstanceIdentity {
    /// Instance id bundles must carry to be processed.
    pub id: i64,

    /// Access key required for base-config bundles.
    pub key: String,

    /// Directory holding fragment stores and the generated alertmanager.yml.
    pub config_path: PathBuf,

    /// Path of the alertmanager.yml template.
    pub template_path: PathBuf,
}

impl InstanceIdentity {
    /// Location of the generated configuration file.
    pub fn output_path(&self) -> PathBuf {
        self.config_path.join("alertmanager.yml")
    }

    /// Directory holding the template and base-config fragments.
    pub fn template_dir(&self) -> &Path {
        self.template_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// File name of the template inside its directory.
    pub fn template_name(&self) -> String {
        self.template_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Reload endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// URL receiving the reload POST (e.g., "http://localhost:9093/-/reload").
    pub url: String,

    /// Delay between attempts while the endpoint refuses connections.
    pub retry_interval_secs: u64,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ReloadConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9093/-/reload".to_string(),
            retry_interval_secs: 8,
            timeout_secs: 30,
        }
    }
}

/// Bundle source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of bundle manifests to watch.
    pub bundles_dir: PathBuf,

    /// Resync interval in seconds (0 disables resync).
    pub resync_secs: u64,

    /// Only bundles in this namespace are seen; unset or empty means all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SourceConfig {
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bundles_dir: PathBuf::from("bundles"),
            resync_secs: 0,
            namespace: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:8080".to_string(),
        }
    }
}
