//! Event bus publishers.

#[cfg(any(test, feature = "test-utils"))]
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::subscription::EventSubscription;
use crate::domain::DiscoveryEvent;
use crate::ports::DiscoveryEventPublisher;

/// Default capacity of the session event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Largest bus capacity; larger requests are clamped to it.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Publisher backed by a `tokio::sync::broadcast` channel.
///
/// Every subscriber sees every event published after it subscribed.
/// A subscriber that falls more than `capacity` events behind loses the
/// oldest ones and is told how many it missed.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<DiscoveryEvent>,
}

impl BroadcastEventPublisher {
    /// Create a bus holding up to `capacity` undelivered events per subscriber.
    ///
    /// `capacity` is clamped to `1..=MAX_EVENT_CAPACITY`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self { sender }
    }

    /// Open a new subscription. Only events published from now on are seen.
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription::new(self.sender.subscribe())
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl DiscoveryEventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: DiscoveryEvent) -> usize {
        // `send` only fails when there are no receivers.
        self.sender.send(event).unwrap_or(0)
    }
}

/// In-memory publisher for testing that stores events.
///
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    events: Mutex<Vec<DiscoveryEvent>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl InMemoryEventPublisher {
    /// Create a new in-memory publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published events.
    #[must_use]
    pub fn events(&self) -> Vec<DiscoveryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all stored events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl DiscoveryEventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: DiscoveryEvent) -> usize {
        match self.events.lock() {
            Ok(mut events) => {
                events.push(event);
                1
            }
            Err(_) => 0,
        }
    }
}
