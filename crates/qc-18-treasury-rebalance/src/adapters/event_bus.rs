//! # Broadcast Event Bus
//!
//! Fans committed events out to any number of subscribers using
//! `tokio::sync::broadcast`. Suitable for a single process; a distributed
//! deployment would forward envelopes to an external bus instead.

use crate::config::RebalanceConfig;
use crate::events::EventEnvelope;
use crate::ports::outbound::EventPublisher;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// In-memory implementation of the event bus.
pub struct BroadcastEventBus {
    sender: broadcast::Sender<EventEnvelope>,
    events_published: AtomicU64,
    capacity: usize,
}

impl BroadcastEventBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with specified capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Create a bus sized by `config.event_channel_capacity`.
    #[must_use]
    pub fn from_config(config: &RebalanceConfig) -> Self {
        Self::with_capacity(config.event_channel_capacity)
    }

    /// Subscribe to all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for BroadcastEventBus {
    fn publish(&self, envelope: EventEnvelope) -> usize {
        let topic = envelope.event.topic();
        let sequence = envelope.sequence;

        // Counted even when nobody is listening
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(envelope) {
            Ok(receivers) => {
                debug!(topic, sequence, receivers, "[qc-18] event published");
                receivers
            }
            Err(_) => {
                warn!(topic, sequence, "[qc-18] event dropped, no receivers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
