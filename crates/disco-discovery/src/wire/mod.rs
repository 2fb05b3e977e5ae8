//! Wire codec for the discovery packets the probe exchanges.

pub mod messages;
pub mod packet;

pub use messages::{Endpoint, Ping, Pong, PROTOCOL_VERSION};
pub use packet::{
    decode_packet, encode_packet, Message, Packet, PacketError, PacketHash, HEADER_LEN,
    MAX_PACKET_SIZE, PACKET_PREFIX, SIGNATURE_LEN,
};
