//! RLP bodies of the packets the probe speaks.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// Protocol version carried in PING.
pub const PROTOCOL_VERSION: u32 = 4;

/// `[ip, udp, tcp]` as carried in PING and PONG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Address (4 or 16 bytes on the wire)
    pub ip: IpAddr,
    /// Discovery port
    pub udp: u16,
    /// Data port
    pub tcp: u16,
}

impl Endpoint {
    /// Endpoint for a UDP address with an explicit TCP port.
    pub fn new(addr: SocketAddr, tcp: u16) -> Self {
        Self {
            ip: addr.ip().to_canonical(),
            udp: addr.port(),
            tcp,
        }
    }

    fn ip_bytes(&self) -> Vec<u8> {
        match self.ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }
}

impl Encodable for Endpoint {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.ip_bytes());
        s.append(&self.udp);
        s.append(&self.tcp);
    }
}

impl Decodable for Endpoint {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? < 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let raw: Vec<u8> = rlp.val_at(0)?;
        let ip = match raw.len() {
            0 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(&raw);
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&raw);
                IpAddr::V6(Ipv6Addr::from(octets)).to_canonical()
            }
            _ => return Err(DecoderError::Custom("endpoint IP must be 4 or 16 bytes")),
        };
        Ok(Self {
            ip,
            udp: rlp.val_at(1)?,
            tcp: rlp.val_at(2)?,
        })
    }
}

/// PING body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    /// Protocol version
    pub version: u32,
    /// Sender endpoint
    pub from: Endpoint,
    /// Recipient endpoint as seen by the sender
    pub to: Endpoint,
    /// Absolute unix seconds after which the packet is stale
    pub expiration: u64,
    /// Topics the sender is registering; always empty for the probe
    pub topics: Vec<String>,
}

impl Encodable for Ping {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.version);
        s.append(&self.from);
        s.append(&self.to);
        s.append(&self.expiration);
        s.begin_list(self.topics.len());
        for topic in &self.topics {
            s.append(topic);
        }
    }
}

impl Decodable for Ping {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList);
        }
        let count = rlp.item_count()?;
        if count < 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        // Trailing items beyond the known ones are ignored.
        let topics = if count > 4 { rlp.list_at(4)? } else { Vec::new() };
        Ok(Self {
            version: rlp.val_at(0)?,
            from: rlp.val_at(1)?,
            to: rlp.val_at(2)?,
            expiration: rlp.val_at(3)?,
            topics,
        })
    }
}

/// PONG body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    /// Recipient endpoint as seen by the sender
    pub to: Endpoint,
    /// Hash of the PING being answered
    pub reply_token: Vec<u8>,
    /// Absolute unix seconds after which the packet is stale
    pub expiration: u64,
    /// Topic ticket fields; zero for the probe
    pub topic_hash: [u8; 32],
    /// Ticket serial; zero for the probe
    pub ticket_serial: u32,
    /// Ticket wait periods; empty for the probe
    pub wait_periods: Vec<u32>,
}

impl Encodable for Pong {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        s.append(&self.to);
        s.append(&self.reply_token);
        s.append(&self.expiration);
        s.append(&self.topic_hash.to_vec());
        s.append(&self.ticket_serial);
        s.begin_list(self.wait_periods.len());
        for period in &self.wait_periods {
            s.append(period);
        }
    }
}

impl Decodable for Pong {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if !rlp.is_list() {
            return Err(DecoderError::RlpExpectedToBeList);
        }
        let count = rlp.item_count()?;
        if count < 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }

        let mut topic_hash = [0u8; 32];
        if count > 3 {
            let raw: Vec<u8> = rlp.val_at(3)?;
            if raw.len() != 32 {
                return Err(DecoderError::Custom("topic hash must be 32 bytes"));
            }
            topic_hash.copy_from_slice(&raw);
        }
        let ticket_serial = if count > 4 { rlp.val_at(4)? } else { 0 };
        let wait_periods = if count > 5 { rlp.list_at(5)? } else { Vec::new() };

        Ok(Self {
            to: rlp.val_at(0)?,
            reply_token: rlp.val_at(1)?,
            expiration: rlp.val_at(2)?,
            topic_hash,
            ticket_serial,
            wait_periods,
        })
    }
}
