//! Transition function.

use super::types::{NodeEvent, NodeState};

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Answer the peer's PING.
    SendPong,
    /// PING the peer and arm the pong timeout.
    SendPing,
    /// Arm the timeout for the peer's own PING.
    ArmPingTimeout,
}

/// Result of feeding one event to one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State after the event.
    pub next: NodeState,
    /// Side effects, in order.
    pub actions: &'static [Action],
    /// False if the event is not valid in the current state.
    pub accepted: bool,
}

impl Step {
    fn to(next: NodeState, actions: &'static [Action]) -> Self {
        Self {
            next,
            actions,
            accepted: true,
        }
    }

    fn reject(state: NodeState) -> Self {
        Self {
            next: state,
            actions: &[],
            accepted: false,
        }
    }
}

/// Feed `event` to a peer in `state`.
pub fn step(state: NodeState, event: NodeEvent) -> Step {
    use Action::*;
    use NodeEvent as E;
    use NodeState as S;

    match (state, event) {
        (S::Unknown | S::Failed, E::Seed) => Step::to(S::VerifyInit, &[SendPing]),
        (S::Unknown | S::Failed, E::Ping) => Step::to(S::VerifyWait, &[SendPong, SendPing]),

        (S::VerifyInit, E::Ping) => Step::to(S::VerifyWait, &[SendPong]),
        (S::VerifyInit, E::Pong) => Step::to(S::RemoteVerifyWait, &[ArmPingTimeout]),

        (S::VerifyWait, E::Ping) => Step::to(S::VerifyWait, &[SendPong]),
        (S::VerifyWait, E::Pong) => Step::to(S::Known, &[]),

        (S::VerifyInit | S::VerifyWait, E::PongTimeout) => Step::to(S::Failed, &[]),

        (S::RemoteVerifyWait, E::Ping) => Step::to(S::RemoteVerifyWait, &[SendPong]),
        (S::RemoteVerifyWait, E::PingTimeout) => Step::to(S::Known, &[]),

        (S::Known, E::Ping) => Step::to(S::Known, &[SendPong]),
        (S::Known, E::Pong) => Step::to(S::Known, &[]),

        // Seeding a peer that is already being verified, or is live, is a no-op.
        (S::VerifyInit | S::VerifyWait | S::RemoteVerifyWait | S::Known, E::Seed) => {
            Step::to(state, &[])
        }

        _ => Step::reject(state),
    }
}
