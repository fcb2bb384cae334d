//! # MoodTune Session
//!
//! Client-side authentication core for MoodTune: who is logged in, and the
//! Spotify authorization-code flow that gets them there.
//!
//! ## Overview
//!
//! The moodtune-session crate handles:
//! - **Session state**: [`SessionState`] snapshots held by a shared
//!   [`SessionStore`] that UI components read and subscribe to
//! - **Auth flow**: [`AuthFlow`] verifies, logs in, completes the callback
//!   and logs out; it is the store's only writer
//! - **Callback view**: [`CallbackView`] turns the provider redirect into
//!   a code exchange (or not) and a navigation
//!
//! The session itself lives on the backend behind a cookie. This crate
//! never inspects the cookie; it only reacts to endpoint success or
//! failure reported through the [`AuthBackend`] trait. The HTTP
//! implementation lives in `moodtune-client`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use moodtune_session::{AuthBackend, AuthFlow, Navigator, Route, SessionStore};
//! use std::sync::Arc;
//!
//! struct Browser;
//!
//! impl Navigator for Browser {
//!     fn redirect(&self, url: &str) {
//!         println!("redirect to {url}");
//!     }
//!
//!     fn navigate(&self, route: Route) {
//!         println!("navigate to {route}");
//!     }
//! }
//!
//! async fn on_load(backend: Arc<dyn AuthBackend>) {
//!     let store = SessionStore::new();
//!     let flow = AuthFlow::new(backend, Arc::new(Browser), store.clone());
//!
//!     // Components subscribe to the same store.
//!     let mut updates = store.subscribe();
//!
//!     flow.verify_session().await;
//!     let state = updates.recv().await.unwrap();
//!     println!("logged in: {}", state.is_authenticated());
//! }
//! ```
//!
//! ## Sequencing
//!
//! Every mutating operation takes a ticket from the store when it starts.
//! Only the most recently started operation may commit, so a late response
//! to a duplicate callback cannot resurrect a session the user has since
//! logged out of.

pub mod backend;
pub mod callback;
pub mod error;
pub mod flow;
pub mod navigation;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use backend::AuthBackend;
pub use callback::{CallbackOutcome, CallbackParams, CallbackView};
pub use error::{
    AuthError, AuthResult, EXCHANGE_FAILED_MESSAGE, EXCHANGE_REJECTED_MESSAGE,
    LOGIN_FAILED_MESSAGE,
};
pub use flow::AuthFlow;
pub use navigation::{Navigator, Route};
pub use store::{OperationTicket, SessionStore, StateSubscription, StoreError, StoreResult};
pub use types::{
    AuthorizationUrl, ProfileImage, SessionGrant, SessionState, SessionStatus, UserIdentity,
};
