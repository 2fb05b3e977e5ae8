//! Verbose diagnostics.
//!
//! With diagnostics enabled the controller forwards every engine event,
//! unfiltered, to a [`DiagnosticSink`]. The sink is injected; nothing here
//! installs global log handlers.

use std::sync::Arc;

use disco_discovery::{DiscoveryEvent, EventSubscription};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Receives every discovery event of a probe run.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: &DiscoveryEvent);
}

/// Sink writing events to the `tracing` diagnostic stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DiscoveryEvent) {
        match event {
            DiscoveryEvent::StateChanged(transition) => {
                debug!(target: "disco::diag", %transition, "state")
            }
            DiscoveryEvent::PacketDropped { from, reason } => {
                debug!(target: "disco::diag", %from, %reason, "dropped")
            }
            DiscoveryEvent::SendFailed { kind, to, reason } => {
                warn!(target: "disco::diag", %kind, %to, %reason, "send failed")
            }
            other => trace!(target: "disco::diag", event = %other, "packet"),
        }
    }
}

/// Hand every event from `events` to `sink` until the bus closes.
pub fn spawn_forwarder(
    mut events: EventSubscription,
    sink: Arc<dyn DiagnosticSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            sink.record(&event);
        }
    })
}
