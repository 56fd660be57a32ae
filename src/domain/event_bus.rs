//! Post-commit fan-out of [`SwapEvent`]s.
//!
//! Services call [`EventBus::publish_committed`] only after the store call
//! that caused the event has committed, so subscribers never observe a
//! change that was rolled back. Delivery is best effort: a bus with no
//! subscribers drops the event, and a subscriber that falls behind the ring
//! buffer loses the oldest events and sees `RecvError::Lagged`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::SwapEvent;

/// Broadcast bus for committed [`SwapEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SwapEvent>,
    published: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus whose ring buffer holds `capacity` events (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fans out an event whose change has been committed.
    pub fn publish_committed(&self, event: SwapEvent) {
        let kind = event.event_type_str();
        self.published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = kind, receivers, "event published"),
            Err(_) => tracing::trace!(event = kind, "event dropped, no subscribers"),
        }
    }

    /// Creates a receiver for every event committed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SwapEvent> {
        self.sender.subscribe()
    }

    /// Number of events committed through this bus, delivered or not.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
