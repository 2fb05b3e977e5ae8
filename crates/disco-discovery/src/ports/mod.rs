//! # Ports Layer
//!
//! Interfaces the engine needs from its host.

pub mod outbound;

pub use outbound::*;
