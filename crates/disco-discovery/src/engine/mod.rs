//! # Discovery Engine
//!
//! Per-peer ping/pong verification for the fallback peers of a session.
//!
//! ```text
//!  datagram ──┐                 ┌── Send (signed packet)
//!  timer    ──┼─► DiscoveryEngine ──┼── Arm (timer key, delay)
//!  seed     ──┘                 └── Event (DiscoveryEvent)
//! ```
//!
//! [`DiscoveryEngine`] is synchronous and owns no I/O; the driver task in
//! [`driver`] feeds it from the socket, the timer queue and the session's
//! command channel, and carries out what it returns.

pub mod config;
pub mod core;
pub(crate) mod driver;
pub mod timers;

pub use config::EngineConfig;
pub use self::core::{DiscoveryEngine, EngineOutput};
pub use timers::{deadline_after, TimerKey, TimerKind, TimerQueue};
