//! Peer state types.

use std::fmt;

/// Handshake state of one remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeState {
    /// Never contacted, or forgotten.
    #[default]
    Unknown,
    /// We sent a PING and wait for the PONG.
    VerifyInit,
    /// The peer pinged us, we pinged back and wait for the PONG.
    VerifyWait,
    /// Our PING was answered; give the peer a moment to ping us too.
    RemoteVerifyWait,
    /// Handshake completed, the peer is considered live.
    Known,
    /// Our PING went unanswered.
    Failed,
}

impl NodeState {
    /// Coarse liveness view of this state.
    pub fn liveness(&self) -> Liveness {
        match self {
            Self::Unknown => Liveness::Unknown,
            Self::VerifyInit | Self::VerifyWait | Self::RemoteVerifyWait => Liveness::Pending,
            Self::Known => Liveness::Known,
            Self::Failed => Liveness::Failed,
        }
    }

    /// Lowercase protocol name, as shown in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::VerifyInit => "verifyinit",
            Self::VerifyWait => "verifywait",
            Self::RemoteVerifyWait => "remoteverifywait",
            Self::Known => "known",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness as seen from outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Liveness {
    /// Not contacted.
    Unknown,
    /// Contact in progress.
    Pending,
    /// Handshake completed.
    Known,
    /// Handshake attempted and did not complete.
    Failed,
}

/// Input to the per-peer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEvent {
    /// Peer registered as fallback/bootstrap node.
    Seed,
    /// Valid PING received from the peer.
    Ping,
    /// PONG received whose reply token matches our outstanding PING.
    Pong,
    /// Our PING was not answered in time.
    PongTimeout,
    /// The peer did not ping us while we waited in `RemoteVerifyWait`.
    PingTimeout,
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seed => "seed",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::PongTimeout => "pong-timeout",
            Self::PingTimeout => "ping-timeout",
        })
    }
}
