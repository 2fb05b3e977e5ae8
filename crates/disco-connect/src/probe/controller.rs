//! # Probe Controller
//!
//! ```text
//!            ┌──────────► Failed        (startup error)
//!   Idle ────┤
//!            └──► Running ──┬──► Succeeded   (rendezvous)
//!                           ├──► TimedOut    (deadline)
//!                           └──► Interrupted (cancellation)
//! ```
//!
//! The three-way race is unbiased. Whatever wins, the session is shut
//! down and its socket released before the verdict is returned.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use disco_discovery::{deadline_after, DiscoverySession, NodeIdentity};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::diagnostics::{spawn_forwarder, DiagnosticSink};
use super::initiator::seed_target;
use super::observer::observe;
use super::result::ProbeResult;
use crate::config::ProbeConfig;

/// Lifecycle of a probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Not started.
    Idle,
    /// Target seeded, racing.
    Running,
    /// Target verified in time.
    Succeeded,
    /// Deadline passed.
    TimedOut,
    /// Cancelled.
    Interrupted,
    /// Could not start.
    Failed,
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::TimedOut => "timed-out",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        })
    }
}

/// Runs one probe against one target.
pub struct ProbeController {
    target: NodeIdentity,
    config: ProbeConfig,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    state: ProbeState,
}

impl ProbeController {
    /// Controller for `target` with `config`.
    pub fn new(target: NodeIdentity, config: ProbeConfig) -> Self {
        Self {
            target,
            config,
            diagnostics: None,
            state: ProbeState::Idle,
        }
    }

    /// Forward every engine event of the run to `sink`.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Probe the target once.
    ///
    /// `cancel` resolves with a reason (e.g. `"interrupt"`) to abort the
    /// run. The deadline counts from the moment this is called.
    pub async fn run<F>(&mut self, cancel: F) -> ProbeResult
    where
        F: Future<Output = String>,
    {
        let deadline = deadline_after(Instant::now(), self.config.timeout);

        let session = match DiscoverySession::start(self.config.session.clone()).await {
            Ok(session) => session,
            Err(err) => {
                warn!(%err, "Probe could not start");
                self.state = ProbeState::Failed;
                return ProbeResult::StartupFailure(err);
            }
        };

        let forwarder = self
            .diagnostics
            .clone()
            .map(|sink| spawn_forwarder(session.subscribe(), sink));
        let mut signal = observe(session.subscribe(), self.target);

        if let Err(err) = seed_target(&session, &self.target).await {
            warn!(%err, "Probe could not seed target");
            self.state = ProbeState::Failed;
            session.shutdown().await;
            return ProbeResult::StartupFailure(err);
        }

        self.state = ProbeState::Running;
        info!(
            target_node = %self.target.id().short(),
            target_addr = %self.target.udp_addr(),
            local = %session.local_addr(),
            timeout = ?self.config.timeout,
            "Probe running"
        );

        let result = tokio::select! {
            rendezvous = signal.fired() => {
                debug!(from = %rendezvous.from, "Rendezvous");
                ProbeResult::Success
            }
            _ = sleep_until(deadline) => ProbeResult::Timeout,
            reason = cancel => ProbeResult::Interrupted(reason),
        };

        drop(signal);
        session.shutdown().await;
        if let Some(forwarder) = forwarder {
            // Ends once the session's bus is gone; flushes remaining events.
            if let Err(err) = forwarder.await {
                warn!(%err, "Diagnostic forwarder ended abnormally");
            }
        }

        self.state = match result {
            ProbeResult::Success => ProbeState::Succeeded,
            ProbeResult::Timeout => ProbeState::TimedOut,
            ProbeResult::Interrupted(_) => ProbeState::Interrupted,
            ProbeResult::StartupFailure(_) => ProbeState::Failed,
        };
        info!(state = %self.state, "Probe finished");
        result
    }
}
