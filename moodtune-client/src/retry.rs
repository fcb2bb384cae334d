//! Retry utilities for transient request failures.
//!
//! [`with_classified_retry`] picks the delay from the failure itself:
//! rate-limited requests wait for the server's `Retry-After`, forbidden
//! requests stop at once, anything else waits a short fixed delay.
//!
//! The backend client wraps mood detection and recommendations in it.
//!
//! # Example
//!
//! ```rust,no_run
//! use moodtune_client::retry::{with_classified_retry, Classify, FailureClass, RetryConfig};
//!
//! #[derive(Debug)]
//! struct Throttled;
//!
//! impl Classify for Throttled {
//!     fn classify(&self) -> FailureClass {
//!         FailureClass::RateLimited { retry_after: None }
//!     }
//! }
//!
//! async fn example() -> Result<String, Throttled> {
//!     with_classified_retry(&RetryConfig::standard(), || async {
//!         Ok("happy".to_string())
//!     })
//!     .await
//! }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429: wait, then retry
    RateLimited {
        /// Server-suggested delay, if it sent one
        retry_after: Option<Duration>,
    },
    /// HTTP 403: never retried
    Forbidden,
    /// Network error, 5xx, or an error embedded in a 2xx body
    Other,
}

impl FailureClass {
    /// Whether another attempt may help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureClass::Forbidden)
    }
}

/// Errors that can say how they should be retried.
pub trait Classify {
    /// Classification of this failure.
    fn classify(&self) -> FailureClass;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Wait after a rate-limited attempt when the server suggests none
    pub rate_limit_delay: Duration,

    /// Wait after any other retryable failure
    pub transient_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay: Duration::from_secs(5),
            transient_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Three attempts, 5 s default rate-limit wait, 1 s transient wait.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Create a configuration for fast retries.
    ///
    /// Same budget as [`standard`](Self::standard) with millisecond delays;
    /// meant for tests and local development.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay: Duration::from_millis(5),
            transient_delay: Duration::from_millis(1),
        }
    }

    /// Create a configuration that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            rate_limit_delay: Duration::ZERO,
            transient_delay: Duration::ZERO,
        }
    }

    /// Delay before the next attempt after a failure of class `class`.
    ///
    /// `None` means stop retrying.
    pub fn delay_for(&self, class: FailureClass) -> Option<Duration> {
        match class {
            FailureClass::RateLimited { retry_after } => {
                Some(retry_after.unwrap_or(self.rate_limit_delay))
            }
            FailureClass::Forbidden => None,
            FailureClass::Other => Some(self.transient_delay),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Execute a function, choosing each retry delay from the failure's class.
///
/// - success returns immediately
/// - [`FailureClass::RateLimited`] waits `retry_after`, or
///   `rate_limit_delay` when the server gave none
/// - [`FailureClass::Forbidden`] returns immediately after one attempt
/// - [`FailureClass::Other`] waits `transient_delay`
///
/// At least one attempt is always made. When the budget runs out the last
/// error is returned; there is no wait after the final attempt. Dropping
/// the returned future abandons any pending wait.
pub async fn with_classified_retry<F, Fut, T, E>(config: &RetryConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Classify + std::fmt::Debug,
{
    let max_attempts = config.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match f().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        let class = error.classify();
        let Some(delay) = config.delay_for(class) else {
            tracing::debug!(error = ?error, ?class, "Error is not retryable, returning immediately");
            return Err(error);
        };

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = ?error, "All retry attempts exhausted");
            return Err(error);
        }

        tracing::warn!(
            attempt = attempt,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis(),
            ?class,
            error = ?error,
            "Attempt failed, retrying"
        );

        sleep(delay).await;
    }
}
