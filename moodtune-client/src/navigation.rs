//! Top-level reaction to client events.

use crate::events::{ClientEvent, EventError, EventSubscription};
use moodtune_session::{Navigator, Route};
use std::sync::Arc;
use tracing::{debug, info};

/// The one place that turns client events into navigation.
pub struct NavigationPolicy<N: ?Sized> {
    navigator: Arc<N>,
}

impl<N: Navigator + ?Sized> NavigationPolicy<N> {
    /// Create a policy navigating with `navigator`.
    pub fn new(navigator: Arc<N>) -> Self {
        Self { navigator }
    }

    /// Route for an event, if it calls for one.
    pub fn route_for(event: &ClientEvent) -> Option<Route> {
        match event {
            ClientEvent::SessionLost { .. } => Some(Route::Login),
        }
    }

    /// React to a single event.
    pub fn handle(&self, event: &ClientEvent) {
        if let Some(route) = Self::route_for(event) {
            info!(event = event.event_type(), %route, "Navigating after client event");
            self.navigator.navigate(route);
        }
    }

    /// Handle events until the client is dropped.
    pub async fn run(&self, mut subscription: EventSubscription) {
        loop {
            match subscription.recv().await {
                Ok(event) => self.handle(&event),
                Err(EventError::ChannelClosed) => {
                    debug!("Client event channel closed");
                    return;
                }
            }
        }
    }
}
