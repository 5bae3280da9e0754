//! Auth-state event bus for the Folio site client.
//!
//! The identity client publishes every session transition here and each
//! subscriber drains its own receiver. Internally the bus uses
//! `tokio::broadcast` with a bounded buffer; a subscriber that falls behind
//! skips the oldest notifications and keeps reading, which is safe because
//! only the most recent session matters to consumers.
//!
//! Publishing never awaits, so it can be called from inside provider code that
//! holds its own session locks.

pub mod payloads;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::debug;

pub use payloads::{
    AuthChange, AuthChangeEvent, DEFAULT_BUS_CAPACITY, EventId, Session, User,
};

/// Metadata wrapper around a published change.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct AuthEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// The notification itself.
    pub change: AuthChange,
}

/// Shared auth-state bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct AuthEventBus {
    sender: Sender<AuthEnvelope>,
    next_id: Arc<AtomicU64>,
}

impl AuthEventBus {
    /// Construct a bus with the provided broadcast capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "auth event bus capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Construct a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Publish a change to every live subscriber and return its identifier.
    ///
    /// Publishing with no subscribers is not an error; the change is dropped.
    pub fn publish(&self, change: AuthChange) -> EventId {
        let envelope = self.envelope(change);
        let id = envelope.id;
        let kind = envelope.change.event.kind();
        match self.sender.send(envelope) {
            Ok(receivers) => debug!(event_id = id, kind, receivers, "auth change published"),
            Err(_) => debug!(event_id = id, kind, "auth change dropped without subscribers"),
        }
        id
    }

    /// Subscribe to live changes.
    #[must_use]
    pub fn subscribe(&self) -> AuthEventStream {
        AuthEventStream {
            backlog: VecDeque::new(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe and queue `initial` ahead of live changes for this subscriber only.
    #[must_use]
    pub fn subscribe_with_initial(&self, initial: AuthChange) -> AuthEventStream {
        let mut stream = self.subscribe();
        stream.backlog.push_back(self.envelope(initial));
        stream
    }

    /// Number of receivers currently attached to the bus.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Identifier of the most recently assigned change, if any.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        match self.next_id.load(Ordering::Relaxed) {
            1 => None,
            next => Some(next - 1),
        }
    }

    fn envelope(&self, change: AuthChange) -> AuthEnvelope {
        AuthEnvelope {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            change,
        }
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuthEventBus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthEventBus")
            .field("subscribers", &self.subscriber_count())
            .field("last_event_id", &self.last_event_id())
            .finish()
    }
}

/// Receiver side of a bus subscription. Dropping it unsubscribes.
pub struct AuthEventStream {
    backlog: VecDeque<AuthEnvelope>,
    receiver: Receiver<AuthEnvelope>,
}

impl AuthEventStream {
    /// Receive the next change, draining the per-subscriber backlog first.
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn next(&mut self) -> Option<AuthEnvelope> {
        if let Some(envelope) = self.backlog.pop_front() {
            return Some(envelope);
        }

        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "auth subscriber lagged; skipping to newer changes");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
