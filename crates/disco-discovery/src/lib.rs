//! # Discovery v5 Prototype Session
//!
//! A minimal implementation of the "temporary discovery v5" UDP protocol:
//! enough to address a peer by its node descriptor, run the signed
//! PING/PONG verification handshake with it, and report every step as a
//! typed event.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Node identities, descriptor parsing, the per-peer
//!   state machine, events
//! - **Wire:** Packet framing, RLP bodies, recoverable signatures
//! - **Ports Layer:** Clock and event publisher traits
//! - **Engine:** Sans-IO handshake engine plus the async driver that feeds it
//! - **Adapters Layer:** System clock, broadcast event bus
//! - **Session:** Key generation, socket binding, driver lifecycle
//!
//! Table maintenance, lookups and topic registration are out of scope;
//! their packets are recognised and dropped.
//!
//! ## Example
//!
//! ```rust
//! use disco_discovery::{NodeIdentity, ParseError};
//!
//! let descriptor = format!(
//!     "enode://{}@127.0.0.1:30303",
//!     "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
//!      483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
//! );
//! let node = NodeIdentity::parse(&descriptor).unwrap();
//! assert_eq!(node.udp_port(), 30303);
//!
//! let truncated = "enode://79be667e@127.0.0.1:30303";
//! assert!(matches!(
//!     NodeIdentity::parse(truncated),
//!     Err(ParseError::InvalidIdLength { .. })
//! ));
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod session;
pub mod wire;

/// Test utilities (FixedTimeSource, seeded keys)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain
pub use domain::{
    decode_node_id, node_id_from_key, verifying_key_from_id, DiscoveryEvent, Liveness,
    NetlistError, Netlist, NodeEvent, NodeId, NodeIdentity, NodeState, PacketKind, ParseError,
    StateTransition, Subnet, Timestamp, NODE_ID_LEN,
};

// Port traits
pub use ports::{DiscoveryEventPublisher, TimeSource};

// Adapters
pub use adapters::{
    BroadcastEventPublisher, EventSubscription, SubscriptionError, SystemTimeSource,
    DEFAULT_EVENT_CAPACITY, MAX_EVENT_CAPACITY,
};

// Engine
pub use engine::{deadline_after, DiscoveryEngine, EngineConfig, EngineOutput};

// Session
pub use session::{
    DiscoverySession, SessionConfig, StartupError, DEFAULT_LISTEN_ADDR, DEFAULT_LISTEN_PORT,
};

// Wire
pub use wire::PacketError;

#[cfg(feature = "test-utils")]
pub use adapters::InMemoryEventPublisher;
#[cfg(feature = "test-utils")]
pub use test_utils::FixedTimeSource;
