//! # Discovery Codec Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Sign + frame a PING | < 100µs |
//! | Decode + recover sender | < 200µs |
//! | Parse a node descriptor (with curve check) | < 50µs |

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use disco_discovery::test_utils::signing_key;
use disco_discovery::wire::{decode_packet, encode_packet, Endpoint, Ping, PROTOCOL_VERSION};
use disco_discovery::{NodeIdentity, PacketKind};
use std::net::SocketAddr;

fn sample_ping() -> Ping {
    let from: SocketAddr = "10.0.0.1:11235".parse().unwrap();
    let to: SocketAddr = "10.0.0.2:30303".parse().unwrap();
    Ping {
        version: PROTOCOL_VERSION,
        from: Endpoint::new(from, from.port()),
        to: Endpoint::new(to, 0),
        expiration: 1_900_000_000,
        topics: Vec::new(),
    }
}

fn bench_encode(c: &mut Criterion) {
    let key = signing_key(1);
    let ping = sample_ping();

    c.bench_function("encode_ping", |b| {
        b.iter(|| encode_packet(&key, PacketKind::Ping, black_box(&ping)).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let (datagram, _) = encode_packet(&signing_key(1), PacketKind::Ping, &sample_ping()).unwrap();

    c.bench_function("decode_ping", |b| {
        b.iter(|| decode_packet(black_box(&datagram)).unwrap())
    });
}

fn bench_parse_descriptor(c: &mut Criterion) {
    let addr: SocketAddr = "10.0.0.2:30303".parse().unwrap();
    let descriptor = NodeIdentity::from_verifying_key(signing_key(2).verifying_key(), addr)
        .to_string();

    c.bench_function("parse_descriptor", |b| {
        b.iter(|| NodeIdentity::parse(black_box(&descriptor)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_parse_descriptor);
criterion_main!(benches);
