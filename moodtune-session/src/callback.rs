//! Handling of the redirect back from the Spotify authorization page.
//!
//! The provider sends the browser back to the callback route with either a
//! one-time `code` or an `error` in the query string. Only a present,
//! non-empty code is ever sent to the backend; anything else navigates away
//! immediately without touching the session.

use crate::backend::AuthBackend;
use crate::flow::{AuthFlow, Exchange};
use crate::navigation::{Navigator, Route};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

/// Query parameters of the authorization callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    /// One-time authorization code
    pub code: Option<String>,

    /// Provider error (e.g. `access_denied`)
    pub error: Option<String>,

    /// Opaque state echoed back by the provider
    pub state: Option<String>,
}

impl CallbackParams {
    /// Parse from a full callback URL or a bare query string.
    ///
    /// Input that is neither yields empty parameters.
    pub fn parse(input: &str) -> Self {
        let query = match Url::parse(input) {
            Ok(url) => url.query().unwrap_or_default().to_string(),
            Err(_) => input
                .split_once('?')
                .map(|(_, query)| query)
                .unwrap_or(input)
                .to_string(),
        };

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "code" => params.code = value,
                "error" => params.error = value,
                "state" => params.state = value,
                _ => {}
            }
        }
        params
    }
}

/// What the callback view did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No code in the URL; nothing was exchanged
    MissingCode,
    /// The provider reported an error; nothing was exchanged
    Denied {
        /// Provider error value
        reason: String,
    },
    /// Code exchanged, user logged in
    Authenticated,
    /// Code exchange failed
    Failed {
        /// Message this exchange left in the session; `None` when a newer
        /// operation replaced its result
        message: Option<String>,
    },
}

impl CallbackOutcome {
    /// Route the view navigates to for this outcome.
    pub fn route(&self) -> Route {
        match self {
            CallbackOutcome::Authenticated => Route::MusicRecommendation,
            CallbackOutcome::MissingCode
            | CallbackOutcome::Denied { .. }
            | CallbackOutcome::Failed { .. } => Route::Home,
        }
    }
}

/// Callback page logic.
pub struct CallbackView<B: ?Sized, N: ?Sized> {
    flow: AuthFlow<B, N>,
}

impl<B, N> CallbackView<B, N>
where
    B: AuthBackend + ?Sized,
    N: Navigator + ?Sized,
{
    /// Create a view driving `flow`.
    pub fn new(flow: AuthFlow<B, N>) -> Self {
        Self { flow }
    }

    /// Process the callback URL and navigate away.
    #[instrument(skip_all)]
    pub async fn complete(&self, callback: &str) -> CallbackOutcome {
        let params = CallbackParams::parse(callback);

        let outcome = match (params.error, params.code) {
            (Some(reason), _) => {
                warn!(%reason, "Authorization was not granted");
                CallbackOutcome::Denied { reason }
            }
            (None, None) => {
                debug!("Callback without code");
                CallbackOutcome::MissingCode
            }
            (None, Some(code)) => match self.flow.exchange(&code).await {
                Exchange::Authenticated => CallbackOutcome::Authenticated,
                Exchange::Failed(message) => CallbackOutcome::Failed {
                    message: Some(message),
                },
                Exchange::Superseded => CallbackOutcome::Failed { message: None },
            },
        };

        self.flow.navigator().navigate(outcome.route());
        outcome
    }
}
