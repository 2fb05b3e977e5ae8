//! Ephemeral node key.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::StartupError;

/// Draws before giving up on finding a valid scalar.
const KEY_GENERATION_ATTEMPTS: usize = 8;

/// Fresh secp256k1 key from the OS RNG.
///
/// A 32-byte draw is a valid scalar unless it is zero or at least the
/// group order, which is astronomically unlikely; the bounded retry only
/// guards against a broken RNG.
pub(crate) fn generate_key() -> Result<SigningKey, StartupError> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    for _ in 0..KEY_GENERATION_ATTEMPTS {
        OsRng
            .try_fill_bytes(&mut bytes[..])
            .map_err(|err| StartupError::KeyGeneration(err.to_string()))?;
        if let Ok(key) = SigningKey::from_bytes((&*bytes).into()) {
            return Ok(key);
        }
    }
    Err(StartupError::KeyGeneration(format!(
        "no valid scalar after {KEY_GENERATION_ATTEMPTS} attempts"
    )))
}
