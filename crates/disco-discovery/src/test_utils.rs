//! Test utilities for discovery sessions.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use disco_discovery::test_utils::FixedTimeSource;
//! use disco_discovery::TimeSource;
//!
//! let time_source = FixedTimeSource::new(1000);
//! assert_eq!(time_source.now().as_secs(), 1000);
//! ```

use std::net::SocketAddr;

use k256::ecdsa::SigningKey;

use crate::domain::{NodeIdentity, Timestamp};
use crate::ports::outbound::TimeSource;

/// A time source that returns a fixed timestamp.
///
/// Two engines given different fixed clocks see each other's packets as
/// expired, which is how expiry is exercised.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: u64,
}

impl FixedTimeSource {
    /// Create a new fixed time source with the given timestamp (in seconds).
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    /// Get the configured timestamp value.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.timestamp)
    }
}

/// Deterministic signing key derived from a one-byte seed.
///
/// # Panics
///
/// For seeds 0 and 255, which are not valid scalars.
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes((&[seed; 32]).into()).expect("non-zero seed is a valid scalar")
}

/// Identity of [`signing_key`]`(seed)` reachable at `addr`.
pub fn identity(seed: u8, addr: SocketAddr) -> NodeIdentity {
    NodeIdentity::from_verifying_key(signing_key(seed).verifying_key(), addr)
}
