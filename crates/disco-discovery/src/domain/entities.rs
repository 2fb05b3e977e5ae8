//! Core Domain Entities for Discovery

use std::fmt;

/// Length of a node identifier: the uncompressed secp256k1 public key
/// without its leading `0x04` tag (X || Y).
pub const NODE_ID_LEN: usize = 64;

/// 512-bit node identifier, the raw public key of a peer.
///
/// # Security
///
/// This type implements constant-time comparison so that matching an
/// attacker-supplied identity against a known one leaks no timing
/// information about where the bytes differ.
// The manual PartialEq is constant-time; hashing the underlying bytes
// stays consistent with it since equal ids have equal bytes.
#[allow(clippy::derived_hash_with_manual_eq)]
#[derive(Clone, Copy, Hash)]
pub struct NodeId(pub [u8; NODE_ID_LEN]);

impl PartialEq for NodeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let mut result = 0u8;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            result |= a ^ b;
        }
        result == 0
    }
}

impl Eq for NodeId {}

impl NodeId {
    /// Create a NodeId from raw 64-byte array.
    ///
    /// No curve check is performed here; use [`crate::NodeIdentity::parse`]
    /// or [`crate::wire`] recovery for validated ids.
    pub fn new(bytes: [u8; NODE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }

    /// First 8 bytes as lowercase hex, the fingerprint used in diagnostics.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}..)", self.short())
    }
}

/// Unix timestamp in seconds
///
/// Packet expirations are expressed in this unit on the wire.
///
/// # Security
///
/// Timestamps are clamped to a reasonable maximum so that a peer sending
/// `u64::MAX` as expiration cannot overflow arithmetic on our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Maximum reasonable timestamp (year 9999).
    pub const MAX_REASONABLE: u64 = 253_402_300_799;

    /// Create a new timestamp, clamping to MAX_REASONABLE.
    pub fn new(secs: u64) -> Self {
        Self(secs.min(Self::MAX_REASONABLE))
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Add seconds to timestamp (saturating at MAX_REASONABLE).
    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs).min(Self::MAX_REASONABLE))
    }

    /// True if a packet stamped with `self` as expiration is stale at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.0 < now.0
    }
}
