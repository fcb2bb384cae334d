//! In-app routes and the navigation seam.

use serde::{Deserialize, Serialize};

/// Application routes the auth core can send the user to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Landing page
    Home,
    /// Login entry point
    Login,
    /// Free-text mood to playlist
    MusicRecommendation,
}

impl Route {
    /// Path of the route.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::MusicRecommendation => "/music-recommendation",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Whatever hosts the UI: performs redirects and route changes.
pub trait Navigator: Send + Sync {
    /// Full-page redirect to an external URL.
    fn redirect(&self, url: &str);

    /// Switch to an in-app route.
    fn navigate(&self, route: Route);
}
