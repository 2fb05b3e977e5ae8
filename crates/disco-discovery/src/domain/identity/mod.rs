//! # Node Identity
//!
//! The address of a remote peer: its public identity plus the endpoint the
//! discovery protocol talks to.
//!
//! Identities are validated once, when they are built. A `NodeIdentity`
//! that exists always carries a point on secp256k1, so nothing downstream
//! has to re-check it.

mod parse;

pub use parse::decode_node_id;

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use k256::ecdsa::VerifyingKey;

use crate::domain::{NodeId, ParseError, NODE_ID_LEN};

/// Immutable peer descriptor: `{id, ip, udp_port, tcp_port}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    id: NodeId,
    ip: IpAddr,
    udp_port: u16,
    tcp_port: u16,
}

impl NodeIdentity {
    /// Build an identity from parts, validating the id against the curve.
    ///
    /// IPv4-mapped IPv6 addresses are stored as IPv4 so that an identity
    /// compares equal to the source address of datagrams it sends.
    pub fn new(id: NodeId, ip: IpAddr, udp_port: u16, tcp_port: u16) -> Result<Self, ParseError> {
        validate_point(&id)?;
        if udp_port == 0 {
            return Err(ParseError::ZeroUdpPort);
        }
        Ok(Self {
            id,
            ip: ip.to_canonical(),
            udp_port,
            tcp_port,
        })
    }

    /// Identity for a key we hold, reachable at `addr`.
    pub fn from_verifying_key(key: &VerifyingKey, addr: SocketAddr) -> Self {
        Self {
            id: node_id_from_key(key),
            ip: addr.ip().to_canonical(),
            udp_port: addr.port(),
            tcp_port: addr.port(),
        }
    }

    /// Parse a canonical `enode://<id>@<ip>:<tcp>[?discport=<udp>]` descriptor.
    ///
    /// No name resolution is performed and no resource is opened.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse::parse_descriptor(text)
    }

    /// The peer's public identity.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// The peer's IP address.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// UDP port of the discovery endpoint.
    pub fn udp_port(&self) -> u16 {
        self.udp_port
    }

    /// TCP port advertised in the descriptor. Not used by the probe.
    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    /// Discovery endpoint the handshake is sent to.
    pub fn udp_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.udp_port)
    }
}

impl std::str::FromStr for NodeIdentity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "enode://{}@{}",
            self.id,
            SocketAddr::new(self.ip, self.tcp_port)
        )?;
        if self.udp_port != self.tcp_port {
            write!(f, "?discport={}", self.udp_port)?;
        }
        Ok(())
    }
}

/// Derive the 64-byte node id from a public key.
pub fn node_id_from_key(key: &VerifyingKey) -> NodeId {
    let point = key.to_encoded_point(false);
    let mut id = [0u8; NODE_ID_LEN];
    // Uncompressed SEC1 is 0x04 || X || Y.
    id.copy_from_slice(&point.as_bytes()[1..]);
    NodeId::new(id)
}

/// Rebuild the public key behind a node id.
pub fn verifying_key_from_id(id: &NodeId) -> Result<VerifyingKey, ParseError> {
    let mut sec1 = [0u8; NODE_ID_LEN + 1];
    sec1[0] = 0x04;
    sec1[1..].copy_from_slice(id.as_bytes());
    VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| ParseError::InvalidPublicKey)
}

fn validate_point(id: &NodeId) -> Result<(), ParseError> {
    verifying_key_from_id(id).map(|_| ())
}

#[cfg(test)]
mod tests;
