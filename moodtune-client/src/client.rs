//! MoodTune backend client.
//!
//! HTTP client for the MoodTune backend. Covers the Spotify auth endpoints,
//! mood detection and music recommendations. Every request carries the
//! session cookie set by the backend; POSTs also carry the configured
//! anti-forgery token.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::{ClientEvent, EventSubscription};
use crate::retry::{with_classified_retry, RetryConfig};
use crate::types::{CapturedFrame, ErrorBody, MoodReport, RecommendationRequest, Recommendations};
use async_trait::async_trait;
use moodtune_session::{
    AuthBackend, AuthError, AuthResult, AuthorizationUrl, SessionGrant, SessionStore,
};
use reqwest::header::RETRY_AFTER;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, instrument, warn};

/// Session verification endpoint.
pub const ME_PATH: &str = "/api/auth/me";
/// Authorization URL endpoint.
pub const SPOTIFY_URL_PATH: &str = "/api/auth/spotify/url";
/// Code exchange endpoint.
pub const SPOTIFY_CALLBACK_PATH: &str = "/api/auth/spotify/callback";
/// Session invalidation endpoint.
pub const LOGOUT_PATH: &str = "/api/auth/logout";
/// Mood inference endpoint.
pub const MOOD_DETECT_PATH: &str = "/api/mood/detect";
/// Recommendation endpoint.
pub const RECOMMENDATIONS_PATH: &str = "/api/music/recommendations";

/// Header carrying the anti-forgery token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

const MOOD_FAILED_MESSAGE: &str = "Failed to analyze mood";
const RECOMMENDATIONS_FAILED_MESSAGE: &str = "Failed to get recommendations";

/// Endpoints whose 401 means "not logged in" rather than "session lost".
fn signals_session_loss(path: &str) -> bool {
    path != ME_PATH && path != SPOTIFY_CALLBACK_PATH
}

/// Seconds from a `Retry-After` header, if it holds a whole number.
fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// MoodTune backend client.
#[derive(Clone)]
pub struct BackendClient {
    /// HTTP client instance, holding the session cookie jar.
    client: Client,

    /// Backend configuration.
    config: ClientConfig,

    /// Retry policy for mood and recommendation requests.
    retry: RetryConfig,

    /// Session-lost notifications.
    events: broadcast::Sender<ClientEvent>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.config.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .expect("Failed to build HTTP client");

        let (events, _) = broadcast::channel(16);
        let retry = config.retry_config();

        Self {
            client,
            config,
            retry,
            events,
        }
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Backend configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Retry policy in use.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Subscribe to client events.
    pub fn events(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.events.subscribe(),
        }
    }

    /// Who is logged in on this session.
    #[instrument(skip(self))]
    pub async fn me(&self) -> ClientResult<SessionGrant> {
        debug!("Checking current session");

        let response = self.client.get(self.config.url(ME_PATH)).send().await?;
        self.handle_response(ME_PATH, response, "Not authenticated")
            .await
    }

    /// Spotify authorization page to redirect to.
    #[instrument(skip(self))]
    pub async fn spotify_auth_url(&self) -> ClientResult<AuthorizationUrl> {
        debug!("Requesting Spotify authorization URL");

        let response = self
            .client
            .get(self.config.url(SPOTIFY_URL_PATH))
            .send()
            .await?;
        let result = self
            .handle_response(SPOTIFY_URL_PATH, response, "Failed to get Spotify auth URL")
            .await;
        self.observe(SPOTIFY_URL_PATH, result)
    }

    /// Exchange a one-time authorization code for a session.
    #[instrument(skip(self, code))]
    pub async fn spotify_callback(&self, code: &str) -> ClientResult<SessionGrant> {
        debug!("Exchanging authorization code");

        let response = self
            .post(SPOTIFY_CALLBACK_PATH)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;
        self.handle_response(SPOTIFY_CALLBACK_PATH, response, "Authentication failed")
            .await
    }

    /// Invalidate the server session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ClientResult<()> {
        debug!("Ending session");

        let response = self.post(LOGOUT_PATH).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        let err = self
            .error_from_response(LOGOUT_PATH, response, "Failed to log out")
            .await;
        self.observe(LOGOUT_PATH, Err(err))
    }

    /// Detect the mood in a captured frame.
    ///
    /// Retried according to the client's [`RetryConfig`].
    #[instrument(skip(self, frame), fields(bytes = frame.bytes().len()))]
    pub async fn detect_mood(&self, frame: &CapturedFrame) -> ClientResult<MoodReport> {
        let result = with_classified_retry(&self.retry, || self.detect_mood_once(frame)).await;
        self.observe(MOOD_DETECT_PATH, result)
    }

    /// Get recommendations for a free-text mood.
    ///
    /// `access_token` is sent as a bearer credential when present. Retried
    /// according to the client's [`RetryConfig`].
    #[instrument(skip(self, access_token))]
    pub async fn recommendations(
        &self,
        mood_description: &str,
        access_token: Option<&str>,
    ) -> ClientResult<Recommendations> {
        let request = RecommendationRequest {
            mood_description: mood_description.to_string(),
        };
        let result = with_classified_retry(&self.retry, || {
            self.recommendations_once(&request, access_token)
        })
        .await;
        self.observe(RECOMMENDATIONS_PATH, result)
    }

    /// Get recommendations on behalf of the session in `store`.
    ///
    /// Fails with [`ClientError::NotConnected`] without any request when no
    /// Spotify account is connected.
    pub async fn recommend_for(
        &self,
        store: &SessionStore,
        mood_description: &str,
    ) -> ClientResult<Recommendations> {
        let state = store.snapshot().await;
        let Some(token) = state.access_token().filter(|_| state.is_authenticated()) else {
            debug!("Recommendations requested without a Spotify session");
            return Err(ClientError::NotConnected);
        };
        self.recommendations(mood_description, Some(token)).await
    }

    async fn detect_mood_once(&self, frame: &CapturedFrame) -> ClientResult<MoodReport> {
        let part = Part::bytes(frame.bytes().to_vec())
            .file_name(frame.file_name().to_string())
            .mime_str(frame.mime())?;
        let form = Form::new().part("file", part);

        let response = self.post(MOOD_DETECT_PATH).multipart(form).send().await?;
        let body: serde_json::Value = self
            .handle_response(MOOD_DETECT_PATH, response, MOOD_FAILED_MESSAGE)
            .await?;

        if let Some(message) = body.get("error").filter(|e| !e.is_null()) {
            let message = message
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| message.to_string());
            warn!(%message, "Mood detection returned an application error");
            return Err(ClientError::Application(message));
        }

        serde_json::from_value(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn recommendations_once(
        &self,
        request: &RecommendationRequest,
        access_token: Option<&str>,
    ) -> ClientResult<Recommendations> {
        let mut builder = self.post(RECOMMENDATIONS_PATH).json(request);
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        self.handle_response(RECOMMENDATIONS_PATH, response, RECOMMENDATIONS_FAILED_MESSAGE)
            .await
    }

    /// Publish [`ClientEvent::SessionLost`] once for a final 401 result.
    fn observe<T>(&self, path: &str, result: ClientResult<T>) -> ClientResult<T> {
        if matches!(result, Err(ClientError::Unauthorized(_))) && signals_session_loss(path) {
            warn!(path, "Session lost");
            // No subscribers is fine.
            let _ = self.events.send(ClientEvent::SessionLost {
                path: path.to_string(),
                occurred_at: chrono::Utc::now(),
            });
        }
        result
    }

    /// POST request with the anti-forgery header, when configured.
    fn post(&self, path: &str) -> RequestBuilder {
        let mut request = self.client.post(self.config.url(path));
        if let Some(ref token) = self.config.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        request
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T>(
        &self,
        path: &str,
        response: Response,
        fallback: &str,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        if !response.status().is_success() {
            return Err(self.error_from_response(path, response, fallback).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn error_from_response(
        &self,
        path: &str,
        response: Response,
        fallback: &str,
    ) -> ClientError {
        let status = response.status();
        let retry_after = parse_retry_after(&response);
        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body.message().unwrap_or_else(|| fallback.to_string());

        match status {
            StatusCode::UNAUTHORIZED => {
                debug!(path, %message, "Not authenticated");
                ClientError::Unauthorized(message)
            }
            StatusCode::FORBIDDEN => {
                error!(path, %message, "Request forbidden");
                ClientError::Forbidden(message)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(path, retry_after_secs = retry_after.map(|d| d.as_secs()), "Rate limited");
                ClientError::RateLimited {
                    retry_after,
                    message,
                }
            }
            _ => {
                warn!(path, status = status.as_u16(), %message, "API error");
                ClientError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl AuthBackend for BackendClient {
    async fn current_session(&self) -> AuthResult<SessionGrant> {
        self.me().await.map_err(AuthError::from)
    }

    async fn authorization_url(&self) -> AuthResult<AuthorizationUrl> {
        self.spotify_auth_url().await.map_err(AuthError::from)
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<SessionGrant> {
        self.spotify_callback(code).await.map_err(AuthError::from)
    }

    async fn end_session(&self) -> AuthResult<()> {
        self.logout().await.map_err(AuthError::from)
    }
}
