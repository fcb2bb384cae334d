//! Error types for authentication operations
//!
//! This module defines the errors an [`AuthBackend`](crate::AuthBackend)
//! reports back to the auth flow. The flow never propagates these to its
//! callers; it folds them into [`SessionState::error`](crate::SessionState::error).

use thiserror::Error;

/// Message shown when the authorization URL cannot be obtained.
pub const LOGIN_FAILED_MESSAGE: &str = "Failed to initiate Spotify login";

/// Message shown when the backend rejects a code exchange without a reason.
pub const EXCHANGE_REJECTED_MESSAGE: &str = "Authentication failed";

/// Message shown when the code exchange never reached the backend.
pub const EXCHANGE_FAILED_MESSAGE: &str = "Failed to complete authentication";

/// Authentication error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The backend answered with a non-success status
    #[error("Request rejected ({status}): {}", detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        /// HTTP status code
        status: u16,
        /// `detail` field of the error body, if the backend gave one
        detail: Option<String>,
    },

    /// The request never produced a response (connect error, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered 2xx but the body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// A rejected request is an expected outcome (expired session, reused
    /// code) and is not a server fault unless the status says so.
    pub fn is_server_error(&self) -> bool {
        match self {
            AuthError::Rejected { status, .. } => *status >= 500,
            AuthError::InvalidResponse(_) | AuthError::Config(_) => true,
            AuthError::Transport(_) => false,
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Rejected { status, .. } => *status,
            AuthError::Transport(_) => 503,
            AuthError::InvalidResponse(_) => 502,
            AuthError::Config(_) => 500,
        }
    }

    /// Get error code for logs and telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Rejected { status: 401, .. } => "UNAUTHORIZED",
            AuthError::Rejected { status: 403, .. } => "FORBIDDEN",
            AuthError::Rejected { status: 429, .. } => "RATE_LIMITED",
            AuthError::Rejected { .. } => "REJECTED",
            AuthError::Transport(_) => "TRANSPORT_ERROR",
            AuthError::InvalidResponse(_) => "INVALID_RESPONSE",
            AuthError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Message to surface to the user after a failed code exchange.
    ///
    /// The backend's `detail` wins; otherwise a fixed fallback depending on
    /// whether the backend answered at all.
    pub fn exchange_message(&self) -> String {
        match self {
            AuthError::Rejected {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => detail.clone(),
            AuthError::Rejected { .. } | AuthError::InvalidResponse(_) => {
                EXCHANGE_REJECTED_MESSAGE.to_string()
            }
            AuthError::Transport(_) | AuthError::Config(_) => EXCHANGE_FAILED_MESSAGE.to_string(),
        }
    }
}
