//! Session data model
//!
//! [`SessionState`] is the value the store hands to readers. Its fields are
//! private and it can only be built through constructors that keep the
//! authenticated flag, the user and the access token consistent.

use serde::{Deserialize, Serialize};

/// Profile picture attached to a Spotify account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileImage {
    /// Image URL
    pub url: String,
}

/// Identity of the authenticated Spotify user, as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    /// Spotify user ID
    pub id: String,

    /// Display name
    pub display_name: String,

    /// Email address
    pub email: String,

    /// Profile pictures, largest first
    #[serde(default)]
    pub images: Vec<ProfileImage>,
}

impl UserIdentity {
    /// URL of the first profile picture, if any.
    pub fn avatar_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }
}

/// Successful body of `/api/auth/me` and `/api/auth/spotify/callback`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionGrant {
    /// Authenticated user
    pub user: UserIdentity,

    /// Opaque Spotify access token
    pub spotify_access_token: String,
}

/// Body of `/api/auth/spotify/url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizationUrl {
    /// External authorization page to redirect to
    pub url: String,
}

/// Conceptual state of the auth state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No verification has completed yet
    Unknown,
    /// Verified as logged out
    Unauthenticated,
    /// Logged in
    Authenticated,
}

/// Snapshot of the client's authentication state.
///
/// Replaced wholesale on every transition; never patched field by field
/// from outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    user: Option<UserIdentity>,
    access_token: Option<String>,
    error: Option<String>,
}

impl SessionState {
    /// Logged out, no error.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Logged in as `user` holding `access_token`, no error.
    pub fn authenticated(user: UserIdentity, access_token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            access_token: Some(access_token.into()),
            error: None,
        }
    }

    /// Logged out with a user-visible failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::unauthenticated().with_error(message)
    }

    /// Same authentication, with `message` as the advisory error.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The logged-in user.
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// Spotify access token of the logged-in user.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Last failure message. Advisory only.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<SessionGrant> for SessionState {
    fn from(grant: SessionGrant) -> Self {
        Self::authenticated(grant.user, grant.spotify_access_token)
    }
}
