//! Domain Errors for Discovery

use thiserror::Error;

/// Errors produced while parsing a peer descriptor.
///
/// Every variant is raised before any network resource exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Scheme other than `enode://`.
    #[error("invalid URL scheme, want \"enode\"")]
    InvalidScheme,

    /// No `id@` part in front of the host.
    #[error("does not contain node ID")]
    MissingNodeId,

    /// Identity is not valid hex.
    #[error("invalid node ID (not hex: {0})")]
    InvalidHex(String),

    /// Identity has the wrong number of bytes.
    #[error("invalid node ID (wrong length, want {expected} hex chars, got {actual})")]
    InvalidIdLength {
        /// Expected hex characters
        expected: usize,
        /// Actual hex characters
        actual: usize,
    },

    /// Identity bytes are not a point on secp256k1.
    #[error("invalid node ID (not a valid secp256k1 public key)")]
    InvalidPublicKey,

    /// Descriptor carries an identity but no endpoint.
    #[error("node descriptor has no address, want enode://<id>@<ip>:<port>")]
    MissingAddress,

    /// `host:port` part could not be split.
    #[error("invalid host: {0}")]
    InvalidHost(String),

    /// Host is not an IP literal.
    #[error("invalid IP address")]
    InvalidIp,

    /// TCP port is not a decimal u16.
    #[error("invalid port")]
    InvalidPort,

    /// `discport` query value is not a decimal u16.
    #[error("invalid discport in query")]
    InvalidDiscPort,

    /// UDP port 0 cannot be probed.
    #[error("UDP port must be non-zero")]
    ZeroUdpPort,
}

/// Errors produced while parsing a restrict netlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlistError {
    /// Entry is not of the form `ip/prefix`.
    #[error("invalid CIDR {0:?}")]
    InvalidCidr(String),

    /// Prefix length exceeds the address width.
    #[error("prefix length {prefix} too long for {cidr:?}")]
    PrefixTooLong {
        /// Offending entry
        cidr: String,
        /// Prefix length given
        prefix: u8,
    },
}
