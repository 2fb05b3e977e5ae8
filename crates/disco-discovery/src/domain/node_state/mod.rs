//! # Peer State Machine
//!
//! Per-peer handshake states of the discovery v5 prototype, and the pure
//! transition function the engine drives.
//!
//! ```text
//!            Seed                Pong
//! unknown ─────────→ verifyinit ─────→ remoteverifywait ──PingTimeout──→ known
//!    │                   │ Ping                                            ↑
//!    │ Ping              ↓                        Pong                     │
//!    └────────────────→ verifywait ────────────────────────────────────────┘
//!
//! verifyinit / verifywait ──PongTimeout──→ failed   (re-seeded on refresh)
//! ```

mod transitions;
mod types;

pub use transitions::{step, Action, Step};
pub use types::{Liveness, NodeEvent, NodeState};
