//! Descriptor grammar.
//!
//! ```text
//! descriptor = "enode://" id "@" host ":" tcp-port [ "?" query ]
//! id         = 128 hex chars, optional "0x" prefix
//! host       = IPv4 literal | "[" IPv6 literal "]"
//! query      = key "=" value *( "&" key "=" value )   ; "discport" sets the UDP port
//! ```

use std::net::IpAddr;

use super::NodeIdentity;
use crate::domain::{NodeId, ParseError, NODE_ID_LEN};

const SCHEME: &str = "enode://";

pub(super) fn parse_descriptor(text: &str) -> Result<NodeIdentity, ParseError> {
    let text = text.trim();
    let rest = strip_scheme(text);

    // Bare ids are valid descriptors for the protocol library but carry no
    // endpoint, so report the id error first and the missing address after.
    let candidate = rest.unwrap_or(text);
    if !candidate.is_empty() && candidate.bytes().all(|b| b.is_ascii_hexdigit()) {
        decode_node_id(candidate)?;
        return Err(ParseError::MissingAddress);
    }

    let rest = rest.ok_or(ParseError::InvalidScheme)?;
    let (user, authority) = rest.split_once('@').ok_or(ParseError::MissingNodeId)?;
    if user.is_empty() {
        return Err(ParseError::MissingNodeId);
    }
    let id = decode_node_id(user)?;

    let (host_port, query) = match authority.split_once('?') {
        Some((hp, q)) => (hp, Some(q)),
        None => (authority, None),
    };
    let host_port = host_port.trim_end_matches('/');

    let (host, port) = split_host_port(host_port)?;
    let ip: IpAddr = host.parse().map_err(|_| ParseError::InvalidIp)?;
    let tcp_port = parse_port(port).ok_or(ParseError::InvalidPort)?;

    let mut udp_port = tcp_port;
    if let Some(discport) = query.and_then(|q| query_value(q, "discport")) {
        if !discport.is_empty() {
            udp_port = parse_port(discport).ok_or(ParseError::InvalidDiscPort)?;
        }
    }

    NodeIdentity::new(id, ip, udp_port, tcp_port)
}

/// Decode and curve-check a hex node id.
pub fn decode_node_id(text: &str) -> Result<NodeId, ParseError> {
    let hex_part = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidHex(hex_part.to_string()));
    }
    if hex_part.len() != NODE_ID_LEN * 2 {
        return Err(ParseError::InvalidIdLength {
            expected: NODE_ID_LEN * 2,
            actual: hex_part.len(),
        });
    }

    let mut bytes = [0u8; NODE_ID_LEN];
    hex::decode_to_slice(hex_part, &mut bytes)
        .map_err(|e| ParseError::InvalidHex(e.to_string()))?;

    let id = NodeId::new(bytes);
    super::validate_point(&id)?;
    Ok(id)
}

fn strip_scheme(text: &str) -> Option<&str> {
    let head = text.get(..SCHEME.len())?;
    head.eq_ignore_ascii_case(SCHEME)
        .then(|| &text[SCHEME.len()..])
}

fn split_host_port(host_port: &str) -> Result<(&str, &str), ParseError> {
    if let Some(bracketed) = host_port.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| ParseError::InvalidHost(format!("missing ']' in {host_port:?}")))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| ParseError::InvalidHost(format!("missing port in {host_port:?}")))?;
        return Ok((host, port));
    }

    let (host, port) = host_port
        .rsplit_once(':')
        .ok_or_else(|| ParseError::InvalidHost(format!("missing port in {host_port:?}")))?;
    if host.contains(':') {
        return Err(ParseError::InvalidHost(format!(
            "too many colons in {host_port:?}"
        )));
    }
    Ok((host, port))
}

/// Strict decimal u16: no sign, no whitespace.
fn parse_port(text: &str) -> Option<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn query_value<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}
