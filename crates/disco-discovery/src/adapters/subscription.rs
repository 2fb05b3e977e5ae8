//! # Event Subscription
//!
//! Receiving side of the session event bus.

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::DiscoveryEvent;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The session that owned the bus is gone.
    #[error("event bus closed")]
    Closed,
}

/// A subscription handle for receiving discovery events.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: broadcast::Receiver<DiscoveryEvent>,
    missed: u64,
}

impl EventSubscription {
    pub(crate) fn new(receiver: broadcast::Receiver<DiscoveryEvent>) -> Self {
        Self {
            receiver,
            missed: 0,
        }
    }

    /// Receive the next event.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next event
    /// - `None` - The bus was closed (session stopped)
    pub async fn recv(&mut self) -> Option<DiscoveryEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.missed = self.missed.saturating_add(count);
                    warn!(lagged = count, "Subscriber lagged, some events dropped");
                }
            }
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The bus was closed
    pub fn try_recv(&mut self) -> Result<Option<DiscoveryEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.missed = self.missed.saturating_add(count);
                }
            }
        }
    }

    /// Total number of events this subscription lost to lag.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }
}
