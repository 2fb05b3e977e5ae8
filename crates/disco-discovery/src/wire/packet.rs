//! Packet framing and signatures.
//!
//! ```text
//! packet = prefix (22) || signature (65) || type (1) || rlp(body)
//! signature = sign(keccak256(type || rlp(body)))   as r || s || v, v in {0, 1}
//! hash = keccak256(signature || type || rlp(body))
//! ```
//!
//! The sender's node ID is never on the wire. It is recovered from the
//! signature.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rlp::{DecoderError, Encodable, Rlp};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use super::messages::{Ping, Pong};
use crate::domain::{node_id_from_key, NodeId, PacketKind};

/// Fixed packet prefix.
pub const PACKET_PREFIX: &[u8] = b"temporary discovery v5";

/// Length of the recoverable signature.
pub const SIGNATURE_LEN: usize = 65;

/// Prefix plus signature.
pub const HEADER_LEN: usize = PACKET_PREFIX.len() + SIGNATURE_LEN;

/// Largest datagram read from the socket.
pub const MAX_PACKET_SIZE: usize = 1280;

/// 32-byte keccak digest.
pub type PacketHash = [u8; 32];

/// Reasons a datagram is not a usable packet.
#[derive(Debug, Error)]
pub enum PacketError {
    /// Shorter than header plus type byte
    #[error("packet too small ({0} bytes)")]
    TooSmall(usize),

    /// Prefix mismatch
    #[error("bad packet prefix")]
    BadPrefix,

    /// Signature could not be parsed or no key recovers from it
    #[error("invalid signature")]
    BadSignature,

    /// Type byte outside 1..=8
    #[error("unknown packet type {0}")]
    UnknownType(u8),

    /// Body failed to decode
    #[error("invalid packet body: {0}")]
    Rlp(#[from] DecoderError),

    /// Local signing failed
    #[error("signing failed")]
    Signing,
}

/// Decoded body. Only PING and PONG are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// PING body
    Ping(Ping),
    /// PONG body
    Pong(Pong),
    /// Any other valid type; body left undecoded
    Other(PacketKind),
}

impl Message {
    /// Wire type of this message.
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Ping(_) => PacketKind::Ping,
            Self::Pong(_) => PacketKind::Pong,
            Self::Other(kind) => *kind,
        }
    }
}

/// A verified inbound packet.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Recovered sender
    pub sender: NodeId,
    /// Packet hash, used as PONG reply token
    pub hash: PacketHash,
    /// Decoded body
    pub message: Message,
}

pub(crate) fn keccak256(data: &[u8]) -> PacketHash {
    Keccak256::digest(data).into()
}

/// Frame and sign a body. Returns the datagram and its hash.
pub fn encode_packet<T: Encodable>(
    key: &SigningKey,
    kind: PacketKind,
    body: &T,
) -> Result<(Vec<u8>, PacketHash), PacketError> {
    let payload = rlp::encode(body);

    let mut packet = Vec::with_capacity(HEADER_LEN + 1 + payload.len());
    packet.extend_from_slice(PACKET_PREFIX);
    packet.resize(HEADER_LEN, 0);
    packet.push(kind.as_byte());
    packet.extend_from_slice(&payload);

    let digest = keccak256(&packet[HEADER_LEN..]);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|_| PacketError::Signing)?;

    let sig_start = PACKET_PREFIX.len();
    packet[sig_start..sig_start + 64].copy_from_slice(&signature.to_bytes());
    packet[sig_start + 64] = recovery_id.to_byte();

    let hash = keccak256(&packet[sig_start..]);
    Ok((packet, hash))
}

/// Check framing, recover the sender and decode the body.
pub fn decode_packet(buf: &[u8]) -> Result<Packet, PacketError> {
    if buf.len() < HEADER_LEN + 1 {
        return Err(PacketError::TooSmall(buf.len()));
    }
    if &buf[..PACKET_PREFIX.len()] != PACKET_PREFIX {
        return Err(PacketError::BadPrefix);
    }

    let sig = &buf[PACKET_PREFIX.len()..HEADER_LEN];
    let signed = &buf[HEADER_LEN..];
    let sender = recover_sender(&keccak256(signed), sig)?;
    let hash = keccak256(&buf[PACKET_PREFIX.len()..]);

    let type_byte = signed[0];
    let kind = PacketKind::from_byte(type_byte).ok_or(PacketError::UnknownType(type_byte))?;
    let body = Rlp::new(&signed[1..]);
    let message = match kind {
        PacketKind::Ping => Message::Ping(body.as_val()?),
        PacketKind::Pong => Message::Pong(body.as_val()?),
        other => Message::Other(other),
    };

    Ok(Packet {
        sender,
        hash,
        message,
    })
}

fn recover_sender(digest: &PacketHash, sig: &[u8]) -> Result<NodeId, PacketError> {
    let signature = Signature::from_slice(&sig[..64]).map_err(|_| PacketError::BadSignature)?;
    let mut recovery_id = RecoveryId::from_byte(sig[64]).ok_or(PacketError::BadSignature)?;

    // Remote stacks may emit high-S signatures; flip to the low-S twin.
    let signature = match signature.normalize_s() {
        Some(low) => {
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
            low
        }
        None => signature,
    };

    let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
        .map_err(|_| PacketError::BadSignature)?;
    Ok(node_id_from_key(&key))
}
