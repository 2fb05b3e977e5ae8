//! Typed events emitted by the discovery engine.
//!
//! Every event is published, unfiltered, on the session's event bus.
//! Consumers decide what they care about: the probe watches
//! [`DiscoveryEvent::StateChanged`] for its target, verbose mode prints
//! everything.

use std::fmt;
use std::net::SocketAddr;

use crate::domain::{NodeEvent, NodeId, NodeState};

/// Discovery packet types, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    /// Liveness check.
    Ping = 1,
    /// Answer to a PING.
    Pong = 2,
    /// Lookup request.
    FindNode = 3,
    /// Lookup response.
    Neighbors = 4,
    /// Lookup request by hash.
    FindNodeHash = 5,
    /// Topic registration.
    TopicRegister = 6,
    /// Topic search.
    TopicQuery = 7,
    /// Topic search response.
    TopicNodes = 8,
}

impl PacketKind {
    /// Decode the type byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => Self::Ping,
            2 => Self::Pong,
            3 => Self::FindNode,
            4 => Self::Neighbors,
            5 => Self::FindNodeHash,
            6 => Self::TopicRegister,
            7 => Self::TopicQuery,
            8 => Self::TopicNodes,
            _ => return None,
        })
    }

    /// Wire type byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::FindNode => "findnode",
            Self::Neighbors => "neighbors",
            Self::FindNodeHash => "findnodeHash",
            Self::TopicRegister => "topicRegister",
            Self::TopicQuery => "topicQuery",
            Self::TopicNodes => "topicNodes",
        })
    }
}

/// A peer moved from one state to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// Subject peer.
    pub node: NodeId,
    /// Address the peer was last seen at.
    pub addr: SocketAddr,
    /// State before the event.
    pub from: NodeState,
    /// State after the event. Never equal to `from`.
    pub to: NodeState,
    /// What caused the move.
    pub trigger: NodeEvent,
}

/// Everything the engine reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A peer changed state.
    StateChanged(StateTransition),
    /// A packet left the socket.
    PacketSent {
        /// Packet type
        kind: PacketKind,
        /// Destination
        to: SocketAddr,
    },
    /// A packet was decoded and its signature recovered.
    PacketReceived {
        /// Packet type
        kind: PacketKind,
        /// Source address
        from: SocketAddr,
        /// Recovered sender
        node: NodeId,
    },
    /// A datagram was discarded before reaching the state machine.
    PacketDropped {
        /// Source address
        from: SocketAddr,
        /// Why
        reason: String,
    },
    /// The socket refused a send.
    SendFailed {
        /// Packet type
        kind: PacketKind,
        /// Destination
        to: SocketAddr,
        /// I/O error text
        reason: String,
    },
}

impl DiscoveryEvent {
    /// The state transition carried by this event, if any.
    pub fn as_transition(&self) -> Option<&StateTransition> {
        match self {
            Self::StateChanged(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {}@{}: {} -> {}",
            self.trigger,
            self.node.short(),
            self.addr,
            self.from,
            self.to
        )
    }
}

impl fmt::Display for DiscoveryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateChanged(t) => write!(f, "state {t}"),
            Self::PacketSent { kind, to } => write!(f, ">>> {kind} to {to}"),
            Self::PacketReceived { kind, from, node } => {
                write!(f, "<<< {kind} from {}@{from}", node.short())
            }
            Self::PacketDropped { from, reason } => write!(f, "drop packet from {from}: {reason}"),
            Self::SendFailed { kind, to, reason } => {
                write!(f, "send {kind} to {to} failed: {reason}")
            }
        }
    }
}
