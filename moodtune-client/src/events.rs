//! Client-wide events.
//!
//! Request handling never navigates by itself. When the backend reports
//! that the session is gone, the client publishes [`ClientEvent::SessionLost`]
//! and the single top-level [`NavigationPolicy`](crate::NavigationPolicy)
//! decides what to do with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// Event error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// The client that published events has been dropped
    #[error("Channel closed")]
    ChannelClosed,
}

/// Events published by the backend client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A request outside the auth endpoints came back 401
    SessionLost {
        /// Path of the request that failed
        path: String,
        /// When the 401 was observed
        occurred_at: DateTime<Utc>,
    },
}

impl ClientEvent {
    /// Dotted event name for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionLost { .. } => "session.lost",
        }
    }
}

/// Subscription handle for receiving client events.
pub struct EventSubscription {
    pub(crate) receiver: broadcast::Receiver<ClientEvent>,
}

impl EventSubscription {
    /// Receive the next event.
    ///
    /// Events missed by a lagging subscriber are skipped.
    pub async fn recv(&mut self) -> Result<ClientEvent, EventError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(EventError::ChannelClosed),
            }
        }
    }
}
