//! # Reachability Probe
//!
//! - [`initiator`] seeds the session with the target
//! - [`observer`] waits for the target to be reported `known`
//! - [`controller`] races that against a deadline and cancellation
//! - [`diagnostics`] forwards the raw event stream in verbose mode

pub mod controller;
pub mod diagnostics;
pub mod initiator;
pub mod observer;
pub mod result;

pub use controller::{ProbeController, ProbeState};
pub use diagnostics::{spawn_forwarder, DiagnosticSink, TracingSink};
pub use initiator::seed_target;
pub use observer::{observe, Rendezvous, RendezvousMatcher, RendezvousSignal};
pub use result::ProbeResult;
