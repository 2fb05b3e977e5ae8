//! Loopback integration tests across `disco-discovery` and `disco-connect`.

pub mod handshake;
pub mod scenarios;
