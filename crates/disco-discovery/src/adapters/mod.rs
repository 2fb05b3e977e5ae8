//! # Adapters
//!
//! Concrete implementations of the outbound ports: the system clock and
//! the broadcast event bus the session exposes to its subscribers.

pub mod publisher;
pub mod subscription;
pub mod time;

pub use publisher::*;
pub use subscription::*;
pub use time::*;

#[cfg(test)]
mod tests;
