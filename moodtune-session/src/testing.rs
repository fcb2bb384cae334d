//! Test doubles shared by the unit tests of this crate.

use crate::backend::AuthBackend;
use crate::error::{AuthError, AuthResult};
use crate::navigation::{Navigator, Route};
use crate::types::{AuthorizationUrl, SessionGrant, UserIdentity};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub(crate) fn grant(user_id: &str, token: &str) -> SessionGrant {
    SessionGrant {
        user: UserIdentity {
            id: user_id.to_string(),
            display_name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            images: vec![],
        },
        spotify_access_token: token.to_string(),
    }
}

struct Script {
    current_session: AuthResult<SessionGrant>,
    authorization_url: AuthResult<String>,
    exchange: AuthResult<SessionGrant>,
    end_session: AuthResult<()>,
}

/// Scripted [`AuthBackend`] that records every call.
pub(crate) struct FakeBackend {
    script: Mutex<Script>,
    calls: Mutex<HashMap<&'static str, usize>>,
    codes: Mutex<Vec<String>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    started: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        let unauthorized = AuthError::Rejected {
            status: 401,
            detail: None,
        };
        Self {
            script: Mutex::new(Script {
                current_session: Err(unauthorized.clone()),
                authorization_url: Err(unauthorized.clone()),
                exchange: Err(unauthorized),
                end_session: Ok(()),
            }),
            calls: Mutex::new(HashMap::new()),
            codes: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            started: Mutex::new(HashMap::new()),
        }
    }
}

impl FakeBackend {
    pub(crate) fn set_current_session(&self, result: AuthResult<SessionGrant>) {
        self.script.lock().unwrap().current_session = result;
    }

    pub(crate) fn set_authorization_url(&self, result: AuthResult<String>) {
        self.script.lock().unwrap().authorization_url = result;
    }

    pub(crate) fn set_exchange(&self, result: AuthResult<SessionGrant>) {
        self.script.lock().unwrap().exchange = result;
    }

    pub(crate) fn set_end_session(&self, result: AuthResult<()>) {
        self.script.lock().unwrap().end_session = result;
    }

    /// Make calls to `name` wait until the returned gate is notified.
    pub(crate) fn hold(&self, name: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(name, Arc::clone(&gate));
        gate
    }

    /// Resolves once a call to `name` has started.
    pub(crate) async fn started(&self, name: &'static str) {
        self.started_signal(name).notified().await;
    }

    fn started_signal(&self, name: &'static str) -> Arc<Notify> {
        Arc::clone(
            self.started
                .lock()
                .unwrap()
                .entry(name)
                .or_insert_with(|| Arc::new(Notify::new())),
        )
    }

    /// Signal that `name` started, then wait on its gate if one is held.
    async fn pause(&self, name: &'static str) {
        let gate = self.gates.lock().unwrap().get(name).cloned();
        self.started_signal(name).notify_one();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    pub(crate) fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub(crate) fn codes(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        *self.calls.lock().unwrap().entry(name).or_insert(0) += 1;
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn current_session(&self) -> AuthResult<SessionGrant> {
        self.record("current_session");
        let result = self.script.lock().unwrap().current_session.clone();
        self.pause("current_session").await;
        result
    }

    async fn authorization_url(&self) -> AuthResult<AuthorizationUrl> {
        self.record("authorization_url");
        self.script
            .lock()
            .unwrap()
            .authorization_url
            .clone()
            .map(|url| AuthorizationUrl { url })
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<SessionGrant> {
        self.record("exchange_code");
        self.codes.lock().unwrap().push(code.to_string());
        let result = self.script.lock().unwrap().exchange.clone();
        self.pause("exchange_code").await;
        result
    }

    async fn end_session(&self) -> AuthResult<()> {
        self.record("end_session");
        self.script.lock().unwrap().end_session.clone()
    }
}

/// [`Navigator`] that remembers where it was sent.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub(crate) fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    pub(crate) fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        self.redirects.lock().unwrap().push(url.to_string());
    }

    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}
