//! Sans-IO discovery engine.
//!
//! The engine never touches a socket or a clock it was not given. Every
//! entry point takes one input (a datagram, a timer expiry, a seed request)
//! and returns the outputs it produced, in order. The driver performs them.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use k256::ecdsa::SigningKey;
use tracing::{debug, trace, warn};

use super::config::EngineConfig;
use super::timers::{TimerKey, TimerKind};
use crate::domain::{
    step, Action, DiscoveryEvent, Netlist, NodeEvent, NodeId, NodeIdentity, NodeState,
    PacketKind, StateTransition, Timestamp,
};
use crate::ports::TimeSource;
use crate::wire::{
    decode_packet, encode_packet, Endpoint, Message, PacketHash, Ping, Pong, PROTOCOL_VERSION,
};

/// Something the driver must do on the engine's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutput {
    /// Put a datagram on the wire.
    Send {
        /// Destination
        to: SocketAddr,
        /// Packet type, for diagnostics
        kind: PacketKind,
        /// Signed datagram
        packet: Vec<u8>,
    },
    /// Call [`DiscoveryEngine::handle_timer`] with `timer` after `after`.
    Arm {
        /// Timer identity
        timer: TimerKey,
        /// Delay from now
        after: Duration,
    },
    /// Publish an event.
    Event(DiscoveryEvent),
}

#[derive(Debug, Clone)]
struct PeerRecord {
    addr: SocketAddr,
    state: NodeState,
    pending_ping: Option<PacketHash>,
    timer_token: u64,
}

/// What a PONG needs from the PING it answers.
struct PingContext {
    hash: PacketHash,
    from_tcp: u16,
}

/// Per-peer handshake engine for one local identity.
pub struct DiscoveryEngine {
    key: SigningKey,
    local: NodeIdentity,
    config: EngineConfig,
    restrict: Option<Netlist>,
    time_source: Box<dyn TimeSource>,
    peers: HashMap<NodeId, PeerRecord>,
    fallback: Vec<NodeIdentity>,
    next_token: u64,
}

impl DiscoveryEngine {
    /// Create an engine signing with `key`, reachable at `local_addr`.
    ///
    /// # Arguments
    ///
    /// * `key` - Local node key; its public half is our identity
    /// * `local_addr` - Address of the bound socket
    /// * `config` - Timers and table size
    /// * `restrict` - If set, peers outside these subnets are ignored
    /// * `time_source` - Clock for packet expirations
    pub fn new(
        key: SigningKey,
        local_addr: SocketAddr,
        config: EngineConfig,
        restrict: Option<Netlist>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        let local = NodeIdentity::from_verifying_key(key.verifying_key(), local_addr);
        Self {
            key,
            local,
            config,
            restrict,
            time_source,
            peers: HashMap::new(),
            fallback: Vec::new(),
            next_token: 0,
        }
    }

    /// Our own identity.
    pub fn local_identity(&self) -> &NodeIdentity {
        &self.local
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current state of a tracked peer.
    pub fn node_state(&self, id: &NodeId) -> Option<NodeState> {
        self.peers.get(id).map(|record| record.state)
    }

    /// Number of tracked peers.
    pub fn tracked_nodes(&self) -> usize {
        self.peers.len()
    }

    /// Replace the fallback set and seed it immediately.
    pub fn set_fallback_nodes(&mut self, nodes: Vec<NodeIdentity>) -> Vec<EngineOutput> {
        debug!(count = nodes.len(), "Setting fallback nodes");
        self.fallback = nodes;
        self.refresh()
    }

    /// Seed every fallback peer that is not live or being verified.
    pub fn refresh(&mut self) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        for node in self.fallback.clone() {
            let id = *node.id();
            if id == *self.local.id() {
                continue;
            }
            if !self.allowed(node.ip()) {
                warn!(node = %id.short(), ip = %node.ip(), "Fallback node outside restrict netlist");
                continue;
            }
            if !self.track(id, node.udp_addr()) {
                warn!(node = %id.short(), "Node table full, fallback node not tracked");
                continue;
            }
            self.apply(id, NodeEvent::Seed, None, &mut out);
        }
        out
    }

    /// Process one inbound datagram.
    pub fn handle_datagram(&mut self, from: SocketAddr, buf: &[u8]) -> Vec<EngineOutput> {
        let from = SocketAddr::new(from.ip().to_canonical(), from.port());
        let mut out = Vec::new();

        if !self.allowed(from.ip()) {
            out.push(dropped(from, "not contained in restrict netlist"));
            return out;
        }

        let packet = match decode_packet(buf) {
            Ok(packet) => packet,
            Err(err) => {
                out.push(dropped(from, err.to_string()));
                return out;
            }
        };
        if packet.sender == *self.local.id() {
            out.push(dropped(from, "packet from self"));
            return out;
        }

        out.push(EngineOutput::Event(DiscoveryEvent::PacketReceived {
            kind: packet.message.kind(),
            from,
            node: packet.sender,
        }));

        match packet.message {
            Message::Ping(ping) => self.handle_ping(from, packet.sender, packet.hash, ping, &mut out),
            Message::Pong(pong) => self.handle_pong(from, packet.sender, pong, &mut out),
            Message::Other(kind) => out.push(dropped(from, format!("unsupported packet type {kind}"))),
        }
        out
    }

    /// Process a timer expiry. Timers superseded by a later arming are ignored.
    pub fn handle_timer(&mut self, timer: TimerKey) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        let current = self.peers.get(&timer.node).map(|record| record.timer_token);
        if current != Some(timer.token) {
            trace!(node = %timer.node.short(), kind = ?timer.kind, "Stale timer ignored");
            return out;
        }
        let event = match timer.kind {
            TimerKind::PongTimeout => NodeEvent::PongTimeout,
            TimerKind::PingTimeout => NodeEvent::PingTimeout,
        };
        self.apply(timer.node, event, None, &mut out);
        out
    }

    fn handle_ping(
        &mut self,
        from: SocketAddr,
        sender: NodeId,
        hash: PacketHash,
        ping: Ping,
        out: &mut Vec<EngineOutput>,
    ) {
        if self.is_expired(ping.expiration) {
            out.push(dropped(from, "ping expired"));
            return;
        }
        let ctx = PingContext {
            hash,
            from_tcp: ping.from.tcp,
        };

        if !self.track(sender, from) {
            debug!(node = %sender.short(), %from, "Node table full, answering untracked peer");
            self.send_pong(from, &ctx, out);
            return;
        }
        if let Some(record) = self.peers.get_mut(&sender) {
            record.addr = from;
        }
        self.apply(sender, NodeEvent::Ping, Some(&ctx), out);
    }

    fn handle_pong(
        &mut self,
        from: SocketAddr,
        sender: NodeId,
        pong: Pong,
        out: &mut Vec<EngineOutput>,
    ) {
        if self.is_expired(pong.expiration) {
            out.push(dropped(from, "pong expired"));
            return;
        }
        let Some(record) = self.peers.get_mut(&sender) else {
            out.push(dropped(from, "unsolicited pong"));
            return;
        };
        let pending = record.pending_ping;
        match pending {
            Some(expected) if expected.as_slice() == pong.reply_token.as_slice() => {
                record.pending_ping = None;
                record.addr = from;
            }
            Some(_) => {
                out.push(dropped(from, "pong reply token mismatch"));
                return;
            }
            None => {
                out.push(dropped(from, "unsolicited pong"));
                return;
            }
        }
        self.apply(sender, NodeEvent::Pong, None, out);
    }

    /// Feed `event` to a tracked peer and carry out what the transition asks for.
    fn apply(
        &mut self,
        id: NodeId,
        event: NodeEvent,
        ping: Option<&PingContext>,
        out: &mut Vec<EngineOutput>,
    ) {
        let Some(record) = self.peers.get_mut(&id) else {
            return;
        };
        let from_state = record.state;
        let result = step(from_state, event);
        if !result.accepted {
            trace!(node = %id.short(), %event, state = %from_state, "Event not valid in state");
            return;
        }

        if result.next != from_state {
            record.state = result.next;
            if matches!(result.next, NodeState::Known | NodeState::Failed) {
                record.pending_ping = None;
            }
            let transition = StateTransition {
                node: id,
                addr: record.addr,
                from: from_state,
                to: result.next,
                trigger: event,
            };
            debug!(%transition, "Node state changed");
            out.push(EngineOutput::Event(DiscoveryEvent::StateChanged(transition)));
        }

        let addr = record.addr;
        for action in result.actions {
            match action {
                Action::SendPong => {
                    if let Some(ctx) = ping {
                        self.send_pong(addr, ctx, out);
                    }
                }
                Action::SendPing => self.send_ping(id, out),
                Action::ArmPingTimeout => self.arm(id, TimerKind::PingTimeout, out),
            }
        }
    }

    fn send_ping(&mut self, id: NodeId, out: &mut Vec<EngineOutput>) {
        let Some(addr) = self.peers.get(&id).map(|record| record.addr) else {
            return;
        };
        let ping = Ping {
            version: PROTOCOL_VERSION,
            from: Endpoint::new(self.local.udp_addr(), self.local.tcp_port()),
            to: Endpoint::new(addr, 0),
            expiration: self.expiration(),
            topics: Vec::new(),
        };
        match encode_packet(&self.key, PacketKind::Ping, &ping) {
            Ok((packet, hash)) => {
                if let Some(record) = self.peers.get_mut(&id) {
                    record.pending_ping = Some(hash);
                }
                out.push(EngineOutput::Send {
                    to: addr,
                    kind: PacketKind::Ping,
                    packet,
                });
                self.arm(id, TimerKind::PongTimeout, out);
            }
            Err(err) => warn!(%err, node = %id.short(), "Failed to encode ping"),
        }
    }

    fn send_pong(&self, to: SocketAddr, ping: &PingContext, out: &mut Vec<EngineOutput>) {
        let pong = Pong {
            to: Endpoint::new(to, ping.from_tcp),
            reply_token: ping.hash.to_vec(),
            expiration: self.expiration(),
            topic_hash: [0u8; 32],
            ticket_serial: 0,
            wait_periods: Vec::new(),
        };
        match encode_packet(&self.key, PacketKind::Pong, &pong) {
            Ok((packet, _)) => out.push(EngineOutput::Send {
                to,
                kind: PacketKind::Pong,
                packet,
            }),
            Err(err) => warn!(%err, %to, "Failed to encode pong"),
        }
    }

    fn arm(&mut self, id: NodeId, kind: TimerKind, out: &mut Vec<EngineOutput>) {
        let Some(record) = self.peers.get_mut(&id) else {
            return;
        };
        self.next_token = self.next_token.wrapping_add(1);
        record.timer_token = self.next_token;
        out.push(EngineOutput::Arm {
            timer: TimerKey {
                node: id,
                kind,
                token: self.next_token,
            },
            after: self.config.response_timeout,
        });
    }

    /// Ensure `id` has a record. False if the table is full.
    fn track(&mut self, id: NodeId, addr: SocketAddr) -> bool {
        if self.peers.contains_key(&id) {
            return true;
        }
        if self.peers.len() >= self.config.max_tracked_nodes {
            return false;
        }
        self.peers.insert(
            id,
            PeerRecord {
                addr,
                state: NodeState::Unknown,
                pending_ping: None,
                timer_token: 0,
            },
        );
        true
    }

    fn allowed(&self, ip: IpAddr) -> bool {
        self.restrict
            .as_ref()
            .map_or(true, |netlist| netlist.contains(ip))
    }

    fn expiration(&self) -> u64 {
        self.time_source
            .now()
            .add_secs(self.config.packet_expiration.as_secs())
            .as_secs()
    }

    fn is_expired(&self, expiration: u64) -> bool {
        Timestamp::new(expiration).is_expired_at(self.time_source.now())
    }
}

fn dropped(from: SocketAddr, reason: impl Into<String>) -> EngineOutput {
    EngineOutput::Event(DiscoveryEvent::PacketDropped {
        from,
        reason: reason.into(),
    })
}
