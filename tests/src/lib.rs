//! # disco-connect Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── codec_benchmarks.rs   # Packet signing and recovery
//! └── src/integration/
//!     ├── scenarios.rs          # Probe verdicts over loopback UDP
//!     └── handshake.rs          # Session-level handshake and restrict netlist
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p disco-tests
//! cargo test -p disco-tests integration::scenarios
//! cargo bench -p disco-tests
//! ```

pub mod integration;
