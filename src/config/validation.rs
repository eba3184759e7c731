//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (retry interval > 0, addresses and log level parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControllerConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use tracing::Level;
use url::Url;

use crate::config::schema::ControllerConfig;

/// A single semantic problem in the controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("instance.config_path must not be empty")]
    MissingConfigPath,

    #[error("instance.template_path must name a file")]
    MissingTemplatePath,

    #[error("reload.url '{url}' is invalid: {reason}")]
    InvalidReloadUrl { url: String, reason: String },

    #[error("reload.retry_interval_secs must be greater than zero")]
    ZeroRetryInterval,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("observability.log_level '{0}' is not a log level")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every issue.
pub fn validate_config(config: &ControllerConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.instance.config_path.as_os_str().is_empty() {
        issues.push(ConfigIssue::MissingConfigPath);
    }
    if config.instance.template_path.file_name().is_none() {
        issues.push(ConfigIssue::MissingTemplatePath);
    }

    match Url::parse(&config.reload.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => issues.push(ConfigIssue::InvalidReloadUrl {
            url: config.reload.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => issues.push(ConfigIssue::InvalidReloadUrl {
            url: config.reload.url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.reload.retry_interval_secs == 0 {
        issues.push(ConfigIssue::ZeroRetryInterval);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.observability.log_level.parse::<Level>().is_err() {
        issues.push(ConfigIssue::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
