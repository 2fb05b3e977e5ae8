//! # Rendezvous Observer
//!
//! Turns the session's event stream into a one-shot signal: the first time
//! the target peer is reported `known` at the target address.
//!
//! ```text
//! EventSubscription ──► watcher task ──► RendezvousMatcher ──► oneshot ──► RendezvousSignal
//! ```
//!
//! Transitions into `failed` do not end the watch; the session keeps
//! retrying the target and a later `known` still counts.

use std::future::pending;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use disco_discovery::{
    DiscoveryEvent, EventSubscription, NodeId, NodeIdentity, NodeState, StateTransition,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The transition that answered the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendezvous {
    /// Target identity
    pub node: NodeId,
    /// Address the target was verified at
    pub addr: SocketAddr,
    /// State the target left
    pub from: NodeState,
}

/// Decides whether a transition answers the probe, at most once.
#[derive(Debug)]
pub struct RendezvousMatcher {
    target: NodeIdentity,
    signaled: AtomicBool,
}

impl RendezvousMatcher {
    /// Matcher for `target`.
    pub fn new(target: NodeIdentity) -> Self {
        Self {
            target,
            signaled: AtomicBool::new(false),
        }
    }

    /// True if `transition` moves the target, at its address, into `known`.
    pub fn matches(&self, transition: &StateTransition) -> bool {
        let addr = SocketAddr::new(transition.addr.ip().to_canonical(), transition.addr.port());
        transition.to == NodeState::Known
            && transition.node == *self.target.id()
            && addr == self.target.udp_addr()
    }

    /// Claim the signal for `event`.
    ///
    /// Returns the rendezvous only for the first matching event, even when
    /// several threads offer matching events at once.
    pub fn offer(&self, event: &DiscoveryEvent) -> Option<Rendezvous> {
        let transition = event.as_transition()?;
        if !self.matches(transition) {
            return None;
        }
        self.signaled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Rendezvous {
            node: transition.node,
            addr: transition.addr,
            from: transition.from,
        })
    }

    /// True once a rendezvous has been claimed.
    pub fn has_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

/// Pending rendezvous. Dropping it stops the watcher.
#[derive(Debug)]
pub struct RendezvousSignal {
    receiver: oneshot::Receiver<Rendezvous>,
    watcher: JoinHandle<()>,
}

impl RendezvousSignal {
    /// Wait for the rendezvous.
    ///
    /// Never completes if the stream ends without one; the caller's
    /// deadline decides then.
    pub async fn fired(&mut self) -> Rendezvous {
        match (&mut self.receiver).await {
            Ok(rendezvous) => rendezvous,
            Err(_) => pending().await,
        }
    }
}

impl Drop for RendezvousSignal {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Start watching `events` for the target becoming known.
///
/// Must be called from within a tokio runtime. Subscribe before seeding so
/// the transition cannot be missed.
pub fn observe(events: EventSubscription, target: NodeIdentity) -> RendezvousSignal {
    let matcher = Arc::new(RendezvousMatcher::new(target));
    let (sender, receiver) = oneshot::channel();

    let watcher = tokio::spawn(async move {
        let mut events = events;
        while let Some(event) = events.recv().await {
            if let Some(rendezvous) = matcher.offer(&event) {
                info!(
                    node = %rendezvous.node.short(),
                    addr = %rendezvous.addr,
                    from = %rendezvous.from,
                    "Target verified"
                );
                // The controller may have stopped listening already.
                let _ = sender.send(rendezvous);
                return;
            }
        }
        debug!("Event stream closed without rendezvous");
    });

    RendezvousSignal { receiver, watcher }
}
