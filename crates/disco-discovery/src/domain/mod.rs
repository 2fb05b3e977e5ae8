//! Domain Layer - Pure discovery logic with no I/O
//!
//! This module contains:
//! - Node identities and descriptor parsing
//! - The per-peer handshake state machine
//! - Typed engine events
//! - The restrict netlist

pub mod entities;
pub mod errors;
pub mod events;
pub mod identity;
pub mod netlist;
pub mod node_state;

pub use entities::*;
pub use errors::*;
pub use events::*;
pub use identity::*;
pub use netlist::*;
pub use node_state::*;
