//! Client configuration.
//!
//! Configuration is loaded from environment variables with defaults for a
//! backend running locally on port 8000.

use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Retry settings in a serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per mood or recommendation request.
    pub max_attempts: u32,

    /// Wait after a 429 without `Retry-After`, in seconds.
    pub rate_limit_delay_secs: u64,

    /// Wait after any other retryable failure, in milliseconds.
    pub transient_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay_secs: 5,
            transient_delay_ms: 1000,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            rate_limit_delay: Duration::from_secs(settings.rate_limit_delay_secs),
            transient_delay: Duration::from_millis(settings.transient_delay_ms),
        }
    }
}

/// Configuration for the backend client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the MoodTune backend.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Anti-forgery token sent as `X-CSRF-Token` on every POST.
    pub csrf_token: Option<String>,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,

    /// Retry policy for mood and recommendation requests.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for ClientConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            csrf_token: None,
            verify_tls: true,
            retry: RetrySettings::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url`, defaults otherwise.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MOODTUNE_API_URL`: backend URL (default: http://localhost:8000)
    /// - `MOODTUNE_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `MOODTUNE_CSRF_TOKEN`: anti-forgery token for POST requests
    /// - `MOODTUNE_VERIFY_TLS`: whether to verify TLS (default: true)
    /// - `MOODTUNE_MAX_ATTEMPTS`: attempts per mood/recommendation request (default: 3)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            base_url: std::env::var("MOODTUNE_API_URL").unwrap_or(default.base_url),
            timeout_secs: std::env::var("MOODTUNE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            csrf_token: std::env::var("MOODTUNE_CSRF_TOKEN").ok(),
            verify_tls: std::env::var("MOODTUNE_VERIFY_TLS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.verify_tls),
            retry: RetrySettings {
                max_attempts: std::env::var("MOODTUNE_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.retry.max_attempts),
                ..default.retry
            },
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for mood and recommendation requests.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from(&self.retry)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("MOODTUNE_API_URL".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("expected an http(s) URL, got {}", self.base_url),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retry.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
