//! Session state store
//!
//! The single source of truth for authentication status. Any number of
//! readers can take snapshots or subscribe to changes; only the auth flow
//! in this crate can write.
//!
//! Writes are sequenced: each mutating operation takes an
//! [`OperationTicket`] when it starts, and its result is applied only if no
//! newer operation has started since. A slow response from an older
//! operation can therefore never overwrite the outcome of a newer one.

use crate::types::{SessionState, SessionStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

/// Store error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Every store handle has been dropped
    #[error("Session store closed")]
    Closed,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Sequence number handed to a mutating operation when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OperationTicket(u64);

impl OperationTicket {
    /// Raw sequence number.
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Subscription handle for receiving state changes.
pub struct StateSubscription {
    receiver: broadcast::Receiver<SessionState>,
}

impl StateSubscription {
    /// Receive the next committed state.
    ///
    /// A subscriber that falls behind skips straight to the newer states
    /// rather than failing.
    pub async fn recv(&mut self) -> StoreResult<SessionState> {
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Ok(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Session subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(StoreError::Closed),
            }
        }
    }
}

struct Slot {
    state: SessionState,
    settled: bool,
}

struct StoreInner {
    slot: RwLock<Slot>,
    sender: broadcast::Sender<SessionState>,
    issued: AtomicU64,
}

/// Shared handle to the session state.
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("issued", &self.inner.issued.load(Ordering::SeqCst))
            .field("subscribers", &self.inner.sender.receiver_count())
            .finish()
    }
}

impl SessionStore {
    /// Create a store in the initial, not yet verified state.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create with custom notification channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(StoreInner {
                slot: RwLock::new(Slot {
                    state: SessionState::unauthenticated(),
                    settled: false,
                }),
                sender,
                issued: AtomicU64::new(0),
            }),
        }
    }

    /// Current state.
    pub async fn snapshot(&self) -> SessionState {
        self.inner.slot.read().await.state.clone()
    }

    /// Current position in the auth state machine.
    pub async fn status(&self) -> SessionStatus {
        let slot = self.inner.slot.read().await;
        if !slot.settled {
            SessionStatus::Unknown
        } else if slot.state.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }

    /// Subscribe to every subsequently committed state.
    pub fn subscribe(&self) -> StateSubscription {
        StateSubscription {
            receiver: self.inner.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }

    /// Start a mutating operation.
    pub(crate) fn begin(&self, operation: &'static str) -> OperationTicket {
        let sequence = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(operation, sequence, "Session operation started");
        OperationTicket(sequence)
    }

    /// Replace the state if `ticket` is still the latest issued.
    ///
    /// Returns whether the state was applied.
    pub(crate) async fn commit(&self, ticket: OperationTicket, state: SessionState) -> bool {
        let mut slot = self.inner.slot.write().await;

        let latest = self.inner.issued.load(Ordering::SeqCst);
        if ticket.0 != latest {
            warn!(
                sequence = ticket.0,
                latest, "Dropping session update from superseded operation"
            );
            return false;
        }

        slot.state = state.clone();
        slot.settled = true;

        // No subscribers is fine.
        let _ = self.inner.sender.send(state);
        true
    }

    /// Attach an advisory error to whatever state is current.
    ///
    /// Takes no ticket, so operations in flight still commit, and leaves an
    /// unverified store unverified.
    pub(crate) async fn set_error(&self, message: &str) {
        let mut slot = self.inner.slot.write().await;
        let next = slot.state.clone().with_error(message);
        slot.state = next.clone();

        let _ = self.inner.sender.send(next);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
