//! Engine tuning.

use std::time::Duration;

use crate::adapters::DEFAULT_EVENT_CAPACITY;

/// Timing and capacity knobs of the discovery engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long to wait for a PONG after sending a PING, and for the
    /// remote's own PING after it answered ours (default: 500 ms)
    pub response_timeout: Duration,
    /// Lifetime stamped into outbound packets (default: 20 s)
    pub packet_expiration: Duration,
    /// Period of the fallback re-seed tick (default: 10 s)
    pub refresh_interval: Duration,
    /// Peers beyond this count are answered but not tracked (default: 64)
    pub max_tracked_nodes: usize,
    /// Undelivered events buffered per subscriber (default: 1024)
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(500),
            packet_expiration: Duration::from_secs(20),
            refresh_interval: Duration::from_secs(10),
            max_tracked_nodes: 64,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Create a config suitable for testing (short timers, tiny table)
    pub fn for_testing() -> Self {
        Self {
            response_timeout: Duration::from_millis(50),
            packet_expiration: Duration::from_secs(20),
            refresh_interval: Duration::from_millis(200),
            max_tracked_nodes: 4,
            event_capacity: 256,
        }
    }
}
