//! HTTP client for the Alertmanager reload endpoint.

use reqwest::StatusCode;
use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::ReloadConfig;
use crate::lifecycle::ShutdownSignal;
use crate::resilience::{retry_fixed, RetryError};

/// Errors returned by a reload attempt.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("invalid reload URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to reach Alertmanager: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code returned from Alertmanager (got: {status}, expected: 200, msg: {message})")]
    UnexpectedStatus { status: u16, message: String },

    #[error("reload cancelled by shutdown")]
    Cancelled,
}

/// Something that can make the downstream service reload its configuration.
pub trait Reload: Send + Sync {
    fn reload(&self) -> impl Future<Output = Result<(), ReloadError>> + Send;
}

/// Reload trigger backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReloadClient {
    http: reqwest::Client,
    url: Url,
    retry_interval: Duration,
    shutdown: ShutdownSignal,
}

impl ReloadClient {
    /// Create a new reload client.
    pub fn new(config: &ReloadConfig, shutdown: ShutdownSignal) -> Result<Self, ReloadError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: Url::parse(&config.url)?,
            retry_interval: config.retry_interval(),
            shutdown,
        })
    }

    /// POST an empty body to the reload URL.
    pub async fn trigger(&self) -> Result<(), ReloadError> {
        let mut signal = self.shutdown.clone();
        let response = retry_fixed(self.retry_interval, &mut signal, is_connection_refused, || {
            self.http.post(self.url.clone()).send()
        })
        .await
        .map_err(|e| match e {
            RetryError::Failed(e) => ReloadError::Transport(e),
            RetryError::Cancelled => ReloadError::Cancelled,
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let message = match body.trim() {
                "" => status.canonical_reason().unwrap_or_default().to_string(),
                text => text.to_string(),
            };
            return Err(ReloadError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

impl Reload for ReloadClient {
    fn reload(&self) -> impl Future<Output = Result<(), ReloadError>> + Send {
        self.trigger()
    }
}

/// True when the request failed because nothing accepted the connection.
fn is_connection_refused(err: &reqwest::Error) -> bool {
    if !err.is_connect() {
        return false;
    }
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == ErrorKind::ConnectionRefused {
                return true;
            }
        }
        if e.to_string().to_ascii_lowercase().contains("connection refused") {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        let config = ReloadConfig {
            url: "not a url".into(),
            ..Default::default()
        };
        let err = ReloadClient::new(&config, ShutdownSignal::never()).unwrap_err();
        assert!(matches!(err, ReloadError::InvalidUrl(_)));
    }

    #[test]
    fn test_status_error_message() {
        let err = ReloadError::UnexpectedStatus {
            status: 500,
            message: "failed to reload config".into(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected status code returned from Alertmanager (got: 500, expected: 200, msg: failed to reload config)"
        );
    }
}
