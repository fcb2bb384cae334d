//! # MoodTune Client
//!
//! HTTP client for the MoodTune backend, the service that detects a mood in
//! a webcam frame and turns it into Spotify recommendations.
//!
//! ## Overview
//!
//! The moodtune-client crate handles:
//! - **Auth endpoints**: session check, Spotify authorization URL, code
//!   exchange and logout; [`BackendClient`] implements
//!   [`moodtune_session::AuthBackend`] so it can drive an
//!   [`AuthFlow`](moodtune_session::AuthFlow)
//! - **Mood detection**: multipart upload of a [`CapturedFrame`]
//! - **Recommendations**: songs and a playlist for a mood description
//! - **Retry**: rate-limited and transient failures of mood and
//!   recommendation requests are retried; forbidden requests are not
//! - **Session loss**: a 401 outside the auth endpoints is published as
//!   [`ClientEvent::SessionLost`] for a single [`NavigationPolicy`]
//!
//! ## Endpoints
//!
//! | Endpoint | Method |
//! |---|---|
//! | `/api/auth/me` | GET |
//! | `/api/auth/spotify/url` | GET |
//! | `/api/auth/spotify/callback` | POST |
//! | `/api/auth/logout` | POST |
//! | `/api/mood/detect` | POST (multipart) |
//! | `/api/music/recommendations` | POST |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use moodtune_client::{BackendClient, CapturedFrame, ClientConfig, NavigationPolicy};
//! use moodtune_session::{AuthFlow, Navigator, Route, SessionStore};
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
//! async fn run(jpeg: Vec<u8>) {
//!     let client = Arc::new(BackendClient::new(ClientConfig::from_env()));
//!     let browser = Arc::new(Browser);
//!     let store = SessionStore::new();
//!     let flow = AuthFlow::new(Arc::clone(&client), Arc::clone(&browser), store.clone());
//!
//!     let policy = NavigationPolicy::new(browser);
//!     let events = client.events();
//!     tokio::spawn(async move { policy.run(events).await });
//!
//!     flow.verify_session().await;
//!
//!     let frame = CapturedFrame::jpeg(jpeg).unwrap();
//!     match client.detect_mood(&frame).await {
//!         Ok(report) => {
//!             let songs = client.recommend_for(&store, &report.dominant_emotion).await;
//!             println!("{songs:?}");
//!         }
//!         Err(e) => println!("{}", e.user_message()),
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod navigation;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::BackendClient;
pub use config::{ClientConfig, ConfigError, RetrySettings};
pub use error::{ClientError, ClientResult};
pub use events::{ClientEvent, EventError, EventSubscription};
pub use navigation::NavigationPolicy;
pub use retry::{with_classified_retry, Classify, FailureClass, RetryConfig};
pub use types::{CapturedFrame, MoodReport, RecommendationRequest, Recommendations};
