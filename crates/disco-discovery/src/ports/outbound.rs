//! # Driven Ports (Outbound SPI)
//!
//! What the discovery engine requires from the process hosting it.

use crate::domain::{DiscoveryEvent, Timestamp};

/// Abstract interface for wall-clock time.
///
/// Packet expirations are absolute unix seconds, so the engine needs a
/// clock. Production uses the system clock; tests pin it.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Event publishing port for the discovery engine.
///
/// This trait abstracts the event bus so the driver can be exercised
/// without a live broadcast channel.
pub trait DiscoveryEventPublisher: Send + Sync {
    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers that will see it. Zero is not an
    /// error: nobody may be listening yet.
    fn publish(&self, event: DiscoveryEvent) -> usize;
}
