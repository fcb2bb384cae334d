//! Backend seam for the auth flow.

use crate::error::AuthResult;
use crate::types::{AuthorizationUrl, SessionGrant};
use async_trait::async_trait;

/// The auth endpoints of the MoodTune backend.
///
/// All calls carry the ambient session cookie; the backend owns the
/// session, the client only reacts to success or failure.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET /api/auth/me`: who is logged in on this session.
    async fn current_session(&self) -> AuthResult<SessionGrant>;

    /// `GET /api/auth/spotify/url`: where to send the user to log in.
    async fn authorization_url(&self) -> AuthResult<AuthorizationUrl>;

    /// `POST /api/auth/spotify/callback`: trade a one-time code for a session.
    async fn exchange_code(&self, code: &str) -> AuthResult<SessionGrant>;

    /// `POST /api/auth/logout`: invalidate the server session.
    async fn end_session(&self) -> AuthResult<()>;
}
