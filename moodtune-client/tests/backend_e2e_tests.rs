//! End-to-End tests for the MoodTune backend client and auth flow.
//!
//! These tests run the client against wiremock servers standing in for the
//! MoodTune backend and check the request/response sequences of:
//! 1. The Spotify login round trip (verify → login → callback)
//! 2. Logout and session loss
//! 3. Mood detection retries (rate limit, forbidden, embedded errors)
//! 4. Recommendations

use moodtune_client::config::ClientConfig;
use moodtune_client::{
    BackendClient, CapturedFrame, ClientError, ClientEvent, EventSubscription, NavigationPolicy,
    RetryConfig,
};
use moodtune_session::{
    AuthFlow, CallbackOutcome, CallbackView, Navigator, Route, SessionState, SessionStatus,
    SessionStore,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Navigator that records redirects and route changes.
#[derive(Default)]
struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    fn routes(&self) -> Vec<Route> {
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

/// Test fixture wiring a client, a store and an auth flow to one mock backend.
struct TestFixture {
    /// Mock MoodTune backend.
    server: MockServer,
    /// Client under test.
    client: Arc<BackendClient>,
    /// Navigator shared by the flow and the navigation policy.
    navigator: Arc<RecordingNavigator>,
    /// Session store shared by the flow and readers.
    store: SessionStore,
    /// Auth flow under test.
    flow: AuthFlow<BackendClient, RecordingNavigator>,
}

impl TestFixture {
    /// Create a new test fixture with a mock server.
    async fn new() -> Self {
        let server = MockServer::start().await;

        let mut config = ClientConfig::new(server.uri());
        config.timeout_secs = 10;
        config.csrf_token = Some("test-csrf-token".to_string());

        let client = Arc::new(BackendClient::new(config).with_retry(RetryConfig::fast()));
        let navigator = Arc::new(RecordingNavigator::default());
        let store = SessionStore::new();
        let flow = AuthFlow::new(Arc::clone(&client), Arc::clone(&navigator), store.clone());

        Self {
            server,
            client,
            navigator,
            store,
            flow,
        }
    }

    /// Callback view driving the fixture's flow.
    fn callback_view(&self) -> CallbackView<BackendClient, RecordingNavigator> {
        CallbackView::new(self.flow.clone())
    }

    /// Log in through a mocked code exchange.
    async fn authenticate(&self) {
        Mock::given(method("POST"))
            .and(path("/api/auth/spotify/callback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
            .mount(&self.server)
            .await;

        assert!(self.flow.handle_callback("abc123").await);
    }
}

fn grant_body() -> serde_json::Value {
    serde_json::json!({
        "user": {
            "id": "u1",
            "display_name": "Ana",
            "email": "a@x.com",
            "images": []
        },
        "spotify_access_token": "tok1"
    })
}

fn mood_body() -> serde_json::Value {
    serde_json::json!({
        "dominant_emotion": "happy",
        "emotions": {"happy": 80.0, "sad": 20.0}
    })
}

fn frame() -> CapturedFrame {
    CapturedFrame::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap()
}

/// True if no event arrives within a short window.
async fn no_event(events: &mut EventSubscription) -> bool {
    tokio::time::timeout(Duration::from_millis(100), events.recv())
        .await
        .is_err()
}

// =============================================================================
// Login round trip
// =============================================================================

/// verify (401) → login → callback with a code → authenticated.
#[tokio::test]
async fn test_login_round_trip() {
    let fixture = TestFixture::new().await;
    let mut events = fixture.client.events();

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Not authenticated"
            })),
        )
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/spotify/url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": "https://accounts.example/auth?client_id=abc&response_type=code"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/spotify/callback"))
        .and(header("X-CSRF-Token", "test-csrf-token"))
        .and(body_json(serde_json::json!({"code": "abc123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
        .expect(1)
        .mount(&fixture.server)
        .await;

    // Step 1: passive verification finds no session.
    assert!(!fixture.flow.verify_session().await);
    assert_eq!(fixture.store.snapshot().await, SessionState::unauthenticated());
    assert_eq!(fixture.store.status().await, SessionStatus::Unauthenticated);

    // A 401 from the verification endpoint is not a lost session.
    assert!(no_event(&mut events).await);

    // Step 2: login redirects to the provider.
    fixture.flow.login().await;
    assert_eq!(
        fixture.navigator.redirects(),
        vec!["https://accounts.example/auth?client_id=abc&response_type=code".to_string()]
    );

    // Step 3: the provider redirects back with a code.
    let outcome = fixture
        .callback_view()
        .complete("https://localhost:5173/callback?code=abc123")
        .await;
    assert_eq!(outcome, CallbackOutcome::Authenticated);
    assert_eq!(fixture.navigator.routes(), vec![Route::MusicRecommendation]);

    let state = fixture.store.snapshot().await;
    assert!(state.is_authenticated());
    let user = state.user().expect("user present when authenticated");
    assert_eq!(user.id, "u1");
    assert_eq!(user.display_name, "Ana");
    assert_eq!(user.email, "a@x.com");
    assert!(user.images.is_empty());
    assert_eq!(state.access_token(), Some("tok1"));
    assert!(state.error().is_none());
}

/// An existing session is picked up on load.
#[tokio::test]
async fn test_verify_session_restores_existing_session() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
        .expect(1)
        .mount(&fixture.server)
        .await;

    assert!(fixture.flow.verify_session().await);
    assert_eq!(fixture.store.status().await, SessionStatus::Authenticated);
    assert!(fixture.navigator.redirects().is_empty());
}

/// A failing authorization URL request leaves an error and no redirect.
#[tokio::test]
async fn test_login_failure_sets_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/spotify/url"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&fixture.server)
        .await;

    fixture.flow.login().await;

    let state = fixture.store.snapshot().await;
    assert!(!state.is_authenticated());
    assert_eq!(state.error(), Some("Failed to initiate Spotify login"));
    assert!(fixture.navigator.redirects().is_empty());
}

/// A callback without a code never reaches the exchange endpoint.
#[tokio::test]
async fn test_callback_without_code_skips_exchange() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/spotify/callback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let outcome = fixture
        .callback_view()
        .complete("https://localhost:5173/callback")
        .await;

    assert_eq!(outcome, CallbackOutcome::MissingCode);
    assert_eq!(fixture.navigator.routes(), vec![Route::Home]);
    assert_eq!(fixture.store.status().await, SessionStatus::Unknown);
}

/// A rejected code leaves the backend's reason in the session.
#[tokio::test]
async fn test_callback_rejected_surfaces_detail() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/spotify/callback"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "detail": "invalid_grant: Invalid authorization code"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let outcome = fixture.callback_view().complete("?code=used-code").await;

    assert_eq!(
        outcome,
        CallbackOutcome::Failed {
            message: Some("invalid_grant: Invalid authorization code".to_string())
        }
    );
    let state = fixture.store.snapshot().await;
    assert!(!state.is_authenticated());
    assert!(state.access_token().is_none());
}

/// A rejected code without a body falls back to the fixed message.
#[tokio::test]
async fn test_callback_rejected_without_detail() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/spotify/callback"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&fixture.server)
        .await;

    assert!(!fixture.flow.handle_callback("abc123").await);
    assert_eq!(
        fixture.store.snapshot().await.error(),
        Some("Authentication failed")
    );
}

// =============================================================================
// Logout and session loss
// =============================================================================

/// Logout clears local state even when the backend call fails.
#[tokio::test]
async fn test_logout_clears_state_on_backend_failure() {
    let fixture = TestFixture::new().await;
    fixture.authenticate().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("X-CSRF-Token", "test-csrf-token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&fixture.server)
        .await;

    fixture.flow.logout().await;

    assert_eq!(fixture.store.snapshot().await, SessionState::unauthenticated());
    assert_eq!(fixture.store.status().await, SessionStatus::Unauthenticated);
}

/// A 401 outside the auth endpoints publishes exactly one session-lost event.
#[tokio::test]
async fn test_unauthorized_recommendations_signal_session_lost() {
    let fixture = TestFixture::new().await;
    fixture.authenticate().await;
    let mut events = fixture.client.events();

    Mock::given(method("POST"))
        .and(path("/api/music/recommendations"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Not authenticated with Spotify"
        })))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .recommendations("calm", Some("tok1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Not authenticated with Spotify"));

    let event = events.recv().await.expect("session lost event");
    assert!(no_event(&mut events).await, "retried 401 must publish one event");
    let policy = NavigationPolicy::new(Arc::clone(&fixture.navigator));
    policy.handle(&event);

    match event {
        ClientEvent::SessionLost { path, .. } => assert_eq!(path, "/api/music/recommendations"),
    }
    assert_eq!(fixture.navigator.routes(), vec![Route::Login]);
}

/// A 401 while asking for the authorization URL means the session is gone.
#[tokio::test]
async fn test_unauthorized_auth_url_signals_session_lost() {
    let fixture = TestFixture::new().await;
    let mut events = fixture.client.events();

    Mock::given(method("GET"))
        .and(path("/api/auth/spotify/url"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Session expired"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture.client.spotify_auth_url().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Session expired"));

    let event = events.recv().await.expect("session lost event");
    match event {
        ClientEvent::SessionLost { path, .. } => assert_eq!(path, "/api/auth/spotify/url"),
    }
    assert!(no_event(&mut events).await);
}

// =============================================================================
// Mood detection
// =============================================================================

/// 429 with `retry-after: 2`, then success after a two second wait.
#[tokio::test]
async fn test_rate_limited_mood_detection_recovers() {
    let fixture = TestFixture::new().await;
    let mut events = fixture.client.events();

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .set_body_json(serde_json::json!({"detail": "Rate limit exceeded"})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .and(header("X-CSRF-Token", "test-csrf-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mood_body()))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let started = Instant::now();
    let report = fixture
        .client
        .detect_mood(&frame())
        .await
        .expect("mood detected after retry");

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(report.dominant_emotion, "happy");
    assert_eq!(report.emotions.get("happy"), Some(&80.0));
    assert_eq!(report.emotions.get("sad"), Some(&20.0));
    assert!(no_event(&mut events).await);
}

/// A request that is always rate limited is tried exactly three times.
#[tokio::test]
async fn test_rate_limited_mood_detection_gives_up_after_three_attempts() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_json(serde_json::json!({"detail": "Rate limit exceeded"})),
        )
        .expect(3)
        .mount(&fixture.server)
        .await;

    let err = fixture.client.detect_mood(&frame()).await.unwrap_err();

    assert!(matches!(err, ClientError::RateLimited { .. }));
    assert_eq!(err.user_message(), "Rate limit exceeded");
}

/// A forbidden request is tried exactly once.
#[tokio::test]
async fn test_forbidden_mood_detection_is_not_retried() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "detail": "Invalid CSRF token"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture.client.detect_mood(&frame()).await.unwrap_err();

    assert!(matches!(err, ClientError::Forbidden(ref m) if m == "Invalid CSRF token"));
}

/// An `error` field in a 2xx body is retried like any other failure.
#[tokio::test]
async fn test_embedded_error_is_retried_then_surfaced() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "No face detected in the image"
        })))
        .expect(3)
        .mount(&fixture.server)
        .await;

    let err = fixture.client.detect_mood(&frame()).await.unwrap_err();

    assert!(matches!(err, ClientError::Application(_)));
    assert_eq!(err.user_message(), "No face detected in the image");
}

/// A server error followed by success needs no caller involvement.
#[tokio::test]
async fn test_server_error_then_success() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "detail": "Error processing image"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/mood/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mood_body()))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let report = fixture.client.detect_mood(&frame()).await.unwrap();
    assert_eq!(report.ranked()[0], ("happy", 80.0));
}

// =============================================================================
// Recommendations
// =============================================================================

/// Recommendations for the current session carry its access token.
#[tokio::test]
async fn test_recommendations_for_session() {
    let fixture = TestFixture::new().await;
    fixture.authenticate().await;

    Mock::given(method("POST"))
        .and(path("/api/music/recommendations"))
        .and(header("Authorization", "Bearer tok1"))
        .and(header("X-CSRF-Token", "test-csrf-token"))
        .and(body_json(serde_json::json!({"mood_description": "happy"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "suggested_songs": "1. Walking on Sunshine - Katrina and the Waves",
            "playlist_url": "https://open.spotify.com/playlist/37i9dQZF1DX3rxVfibe1L0"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let recommendations = fixture
        .client
        .recommend_for(&fixture.store, "happy")
        .await
        .expect("recommendations");

    assert!(recommendations.suggested_songs.contains("Walking on Sunshine"));
    assert_eq!(
        recommendations.playlist_url,
        "https://open.spotify.com/playlist/37i9dQZF1DX3rxVfibe1L0"
    );
}

/// Without a session no recommendation request is made.
#[tokio::test]
async fn test_recommendations_require_connected_account() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/music/recommendations"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client
        .recommend_for(&fixture.store, "happy")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotConnected));
}
