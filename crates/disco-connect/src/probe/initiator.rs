//! Handshake initiator.

use disco_discovery::{DiscoverySession, NodeIdentity, StartupError};
use tracing::debug;

/// Register `target` as the session's only fallback peer.
///
/// The session pings it at once and keeps re-seeding it on every refresh
/// tick while it is unknown or failed, so one call is all the probe needs.
///
/// # Errors
///
/// [`StartupError::SessionClosed`] if the session driver has stopped.
pub async fn seed_target(
    session: &DiscoverySession,
    target: &NodeIdentity,
) -> Result<(), StartupError> {
    debug!(node = %target.id().short(), addr = %target.udp_addr(), "Seeding target");
    session.set_fallback_nodes(vec![*target]).await
}
