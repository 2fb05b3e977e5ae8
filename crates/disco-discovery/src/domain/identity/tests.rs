//! Tests for descriptor parsing

use super::*;
use k256::ecdsa::SigningKey;
use std::net::{Ipv4Addr, Ipv6Addr};

fn fixture_key(seed: u8) -> VerifyingKey {
    let secret = [seed; 32];
    SigningKey::from_bytes((&secret).into())
        .expect("non-zero scalar")
        .verifying_key()
        .clone()
}

fn fixture_hex(seed: u8) -> String {
    node_id_from_key(&fixture_key(seed)).to_string()
}

// =============================================================================
// Well-formed descriptors
// =============================================================================

#[test]
fn test_parse_ipv4_descriptor() {
    let hex = fixture_hex(0x11);
    let identity = NodeIdentity::parse(&format!("enode://{hex}@10.1.2.3:30303")).unwrap();

    assert_eq!(identity.id().to_string(), hex);
    assert_eq!(identity.ip(), IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)));
    assert_eq!(identity.tcp_port(), 30303);
    assert_eq!(identity.udp_port(), 30303);
}

#[test]
fn test_parse_discport_overrides_udp_port() {
    let hex = fixture_hex(0x11);
    let identity =
        NodeIdentity::parse(&format!("enode://{hex}@10.1.2.3:30303?discport=30301")).unwrap();

    assert_eq!(identity.tcp_port(), 30303);
    assert_eq!(identity.udp_port(), 30301);
    assert_eq!(identity.udp_addr(), "10.1.2.3:30301".parse().unwrap());
}

#[test]
fn test_parse_ipv6_descriptor() {
    let hex = fixture_hex(0x22);
    let identity = NodeIdentity::parse(&format!("enode://{hex}@[::1]:11235")).unwrap();

    assert_eq!(identity.ip(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    assert_eq!(identity.udp_port(), 11235);
}

#[test]
fn test_parse_canonicalises_ipv4_mapped_addresses() {
    let hex = fixture_hex(0x22);
    let identity = NodeIdentity::parse(&format!("enode://{hex}@[::ffff:127.0.0.1]:11235")).unwrap();

    assert_eq!(identity.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
}

#[test]
fn test_parse_accepts_uppercase_scheme_and_0x_prefix() {
    let hex = fixture_hex(0x33);
    let identity = NodeIdentity::parse(&format!("ENODE://0x{hex}@1.2.3.4:1")).unwrap();
    assert_eq!(identity.id().to_string(), hex);
}

#[test]
fn test_parse_is_deterministic() {
    let text = format!("enode://{}@192.168.0.7:30303?discport=30304", fixture_hex(0x44));
    let first = NodeIdentity::parse(&text).unwrap();
    let second = NodeIdentity::parse(&text).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.id().as_bytes(), second.id().as_bytes());
}

#[test]
fn test_display_renders_canonical_descriptor() {
    let hex = fixture_hex(0x55);
    let plain = format!("enode://{hex}@1.2.3.4:30303");
    let with_disc = format!("enode://{hex}@[::1]:30303?discport=30301");

    assert_eq!(NodeIdentity::parse(&plain).unwrap().to_string(), plain);
    assert_eq!(NodeIdentity::parse(&with_disc).unwrap().to_string(), with_disc);
}

#[test]
fn test_from_verifying_key_matches_parsed_identity() {
    let key = fixture_key(0x66);
    let local = NodeIdentity::from_verifying_key(&key, "127.0.0.1:4000".parse().unwrap());
    let parsed: NodeIdentity = local.to_string().parse().unwrap();

    assert_eq!(local, parsed);
}

// =============================================================================
// Malformed descriptors
// =============================================================================

#[test]
fn test_truncated_identity_is_rejected() {
    let hex = fixture_hex(0x11);
    let result = NodeIdentity::parse(&format!("enode://{}@1.2.3.4:30303", &hex[..100]));

    assert_eq!(
        result,
        Err(ParseError::InvalidIdLength {
            expected: 128,
            actual: 100
        })
    );
}

#[test]
fn test_identity_off_curve_is_rejected() {
    let zeros = "00".repeat(64);
    let result = NodeIdentity::parse(&format!("enode://{zeros}@1.2.3.4:30303"));
    assert_eq!(result, Err(ParseError::InvalidPublicKey));
}

#[test]
fn test_non_hex_identity_is_rejected() {
    let mut hex = fixture_hex(0x11);
    hex.replace_range(0..1, "z");
    let result = NodeIdentity::parse(&format!("enode://{hex}@1.2.3.4:30303"));
    assert!(matches!(result, Err(ParseError::InvalidHex(_))));
}

#[test]
fn test_bare_identity_has_no_address() {
    let hex = fixture_hex(0x11);
    assert_eq!(NodeIdentity::parse(&hex), Err(ParseError::MissingAddress));
    assert_eq!(
        NodeIdentity::parse(&format!("enode://{hex}")),
        Err(ParseError::MissingAddress)
    );
}

#[test]
fn test_wrong_scheme_is_rejected() {
    let hex = fixture_hex(0x11);
    assert_eq!(
        NodeIdentity::parse(&format!("enr://{hex}@1.2.3.4:30303")),
        Err(ParseError::InvalidScheme)
    );
}

#[test]
fn test_missing_node_id_is_rejected() {
    assert_eq!(
        NodeIdentity::parse("enode://1.2.3.4:30303"),
        Err(ParseError::MissingNodeId)
    );
    assert_eq!(
        NodeIdentity::parse("enode://@1.2.3.4:30303"),
        Err(ParseError::MissingNodeId)
    );
}

#[test]
fn test_hostname_is_not_resolved() {
    let hex = fixture_hex(0x11);
    assert_eq!(
        NodeIdentity::parse(&format!("enode://{hex}@localhost:30303")),
        Err(ParseError::InvalidIp)
    );
}

#[test]
fn test_out_of_range_ports_are_rejected() {
    let hex = fixture_hex(0x11);
    assert_eq!(
        NodeIdentity::parse(&format!("enode://{hex}@1.2.3.4:65536")),
        Err(ParseError::InvalidPort)
    );
    assert_eq!(
        NodeIdentity::parse(&format!("enode://{hex}@1.2.3.4:+80")),
        Err(ParseError::InvalidPort)
    );
    assert_eq!(
        NodeIdentity::parse(&format!("enode://{hex}@1.2.3.4:30303?discport=70000")),
        Err(ParseError::InvalidDiscPort)
    );
}

#[test]
fn test_missing_port_is_rejected() {
    let hex = fixture_hex(0x11);
    assert!(matches!(
        NodeIdentity::parse(&format!("enode://{hex}@1.2.3.4")),
        Err(ParseError::InvalidHost(_))
    ));
    assert!(matches!(
        NodeIdentity::parse(&format!("enode://{hex}@::1:30303")),
        Err(ParseError::InvalidHost(_))
    ));
}

#[test]
fn test_zero_udp_port_is_rejected() {
    let hex = fixture_hex(0x11);
    assert_eq!(
        NodeIdentity::parse(&format!("enode://{hex}@1.2.3.4:0")),
        Err(ParseError::ZeroUdpPort)
    );
}
