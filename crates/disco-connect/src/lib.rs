//! # disco-connect
//!
//! Answers one question: does the peer behind a node descriptor complete
//! a discovery v5 ping/pong handshake with us within the deadline?
//!
//! ```text
//! NodeIdentity ──► ProbeController ──► DiscoverySession (disco-discovery)
//!                        │                     │
//!                        │◄── RendezvousSignal ┘ (first `known` for the target)
//!                        ▼
//!                   ProbeResult ──► exit code
//! ```
//!
//! The binary in `main.rs` adds argument parsing, config layering,
//! signal handling and log setup on top of this library.

pub mod config;
pub mod probe;
pub mod telemetry;

pub use config::{ConfigError, ConfigOverrides, ProbeConfig, DEFAULT_PROBE_TIMEOUT};
pub use probe::{
    observe, seed_target, DiagnosticSink, ProbeController, ProbeResult, ProbeState, Rendezvous,
    RendezvousMatcher, RendezvousSignal, TracingSink,
};
pub use telemetry::{init_tracing, TelemetryError};
