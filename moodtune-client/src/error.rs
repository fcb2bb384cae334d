//! Backend client errors.

use crate::retry::{Classify, FailureClass};
use moodtune_session::AuthError;
use std::time::Duration;
use thiserror::Error;

/// Backend client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The backend is throttling this client.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Server-suggested wait.
        retry_after: Option<Duration>,
        /// Error message from the API.
        message: String,
    },

    /// The backend refused the request (e.g. bad anti-forgery token).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The session cookie is missing or expired.
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A 2xx body carrying an `error` field.
    #[error("{0}")]
    Application(String),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// No usable image was captured.
    #[error("{0}")]
    Capture(String),

    /// Spotify is not connected for this session.
    #[error("Please connect your Spotify account first")]
    NotConnected,
}

/// Result type for backend client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// HTTP status the backend answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RateLimited { .. } => Some(429),
            ClientError::Forbidden(_) => Some(403),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short message suitable for an inline banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::RateLimited { message, .. }
            | ClientError::Forbidden(message)
            | ClientError::Unauthorized(message)
            | ClientError::Api { message, .. }
            | ClientError::Application(message)
            | ClientError::Capture(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl Classify for ClientError {
    fn classify(&self) -> FailureClass {
        match self {
            ClientError::RateLimited { retry_after, .. } => FailureClass::RateLimited {
                retry_after: *retry_after,
            },
            ClientError::Forbidden(_) => FailureClass::Forbidden,
            _ => FailureClass::Other,
        }
    }
}

impl From<ClientError> for AuthError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RequestFailed(e) => AuthError::Transport(e.to_string()),
            ClientError::InvalidResponse(message) => AuthError::InvalidResponse(message),
            ClientError::Unauthorized(message) => AuthError::Rejected {
                status: 401,
                detail: Some(message),
            },
            ClientError::RateLimited { message, .. } => AuthError::Rejected {
                status: 429,
                detail: Some(message),
            },
            ClientError::Forbidden(message) => AuthError::Rejected {
                status: 403,
                detail: Some(message),
            },
            ClientError::Api { status, message } => AuthError::Rejected {
                status,
                detail: Some(message),
            },
            ClientError::Application(message) => AuthError::InvalidResponse(message),
            ClientError::Capture(message) => AuthError::Config(message),
            ClientError::NotConnected => AuthError::Rejected {
                status: 401,
                detail: Some(ClientError::NotConnected.to_string()),
            },
        }
    }
}
