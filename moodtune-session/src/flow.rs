//! Auth flow controller
//!
//! Drives the Spotify authorization-code flow against the backend and is the
//! only writer of the [`SessionStore`]:
//!
//! ```text
//! Unknown ──verify ok──▶ Authenticated ──logout──▶ Unauthenticated
//!    │                        ▲                          │
//!    └──verify fails──▶ Unauthenticated ──login──▶ (external redirect)
//!                             ▲                          │
//!                             └──callback fails──────────┤
//!                       Authenticated ◀──callback ok─────┘
//! ```
//!
//! Backend failures never escape these methods. They end up in
//! [`SessionState::error`] or, for passive verification, are dropped.

use crate::backend::AuthBackend;
use crate::error::LOGIN_FAILED_MESSAGE;
use crate::navigation::Navigator;
use crate::store::SessionStore;
use crate::types::SessionState;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// How a code exchange ended, from the caller's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Exchange {
    Authenticated,
    /// Message committed to the session
    Failed(String),
    /// A newer operation started first; nothing was applied
    Superseded,
}

/// Auth flow controller.
///
/// The backend, the navigator and the store are passed in explicitly; any
/// component that needs to read the session gets a clone of the same
/// [`SessionStore`].
pub struct AuthFlow<B: ?Sized, N: ?Sized> {
    backend: Arc<B>,
    navigator: Arc<N>,
    store: SessionStore,
}

impl<B: ?Sized, N: ?Sized> Clone for AuthFlow<B, N> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            navigator: Arc::clone(&self.navigator),
            store: self.store.clone(),
        }
    }
}

impl<B, N> AuthFlow<B, N>
where
    B: AuthBackend + ?Sized,
    N: Navigator + ?Sized,
{
    /// Create a controller writing to `store`.
    pub fn new(backend: Arc<B>, navigator: Arc<N>, store: SessionStore) -> Self {
        Self {
            backend,
            navigator,
            store,
        }
    }

    /// The store this controller writes to.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The navigator used for redirects.
    pub fn navigator(&self) -> &Arc<N> {
        &self.navigator
    }

    /// Passive session check, run once per application load.
    ///
    /// A failure just means "not logged in" and leaves no error behind.
    /// Returns whether a session was found.
    #[instrument(skip(self))]
    pub async fn verify_session(&self) -> bool {
        let ticket = self.store.begin("verify_session");

        let next = match self.backend.current_session().await {
            Ok(grant) => {
                debug!(user_id = %grant.user.id, "Existing session found");
                SessionState::from(grant)
            }
            Err(e) => {
                debug!(error = %e, code = e.error_code(), "No active session");
                SessionState::unauthenticated()
            }
        };

        let authenticated = next.is_authenticated();
        let applied = self.store.commit(ticket, next).await;
        applied && authenticated
    }

    /// Send the user to the Spotify authorization page.
    ///
    /// On failure only the error is set. An existing session is kept and a
    /// verification still in flight is not superseded.
    #[instrument(skip(self))]
    pub async fn login(&self) {
        match self.backend.authorization_url().await {
            Ok(target) => {
                debug!("Redirecting to authorization page");
                self.navigator.redirect(&target.url);
            }
            Err(e) => {
                warn!(error = %e, "Failed to obtain authorization URL");
                self.store.set_error(LOGIN_FAILED_MESSAGE).await;
            }
        }
    }

    /// Complete the flow with the one-time `code` from the redirect.
    ///
    /// Reusing a code fails server-side and is reported like any other
    /// failed exchange. Returns whether the user ended up authenticated.
    pub async fn handle_callback(&self, code: &str) -> bool {
        self.exchange(code).await == Exchange::Authenticated
    }

    #[instrument(skip(self, code))]
    pub(crate) async fn exchange(&self, code: &str) -> Exchange {
        let ticket = self.store.begin("handle_callback");

        let (next, outcome) = match self.backend.exchange_code(code).await {
            Ok(grant) => {
                debug!(user_id = %grant.user.id, "Authorization code exchanged");
                (SessionState::from(grant), Exchange::Authenticated)
            }
            Err(e) => {
                if e.is_server_error() {
                    error!(error = %e, code = e.error_code(), "Code exchange failed");
                } else {
                    warn!(error = %e, code = e.error_code(), "Code exchange rejected");
                }
                let message = e.exchange_message();
                (
                    SessionState::failed(message.clone()),
                    Exchange::Failed(message),
                )
            }
        };

        if self.store.commit(ticket, next).await {
            outcome
        } else {
            Exchange::Superseded
        }
    }

    /// Log out. The local state is reset even if the backend call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let ticket = self.store.begin("logout");

        if let Err(e) = self.backend.end_session().await {
            warn!(error = %e, "Backend logout failed; clearing local session anyway");
        }

        self.store
            .commit(ticket, SessionState::unauthenticated())
            .await;
    }
}
