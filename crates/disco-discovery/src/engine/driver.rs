//! Background task that runs one engine against one socket.

use std::future::pending;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::core::{DiscoveryEngine, EngineOutput};
use super::timers::{deadline_after, TimerQueue};
use crate::domain::{DiscoveryEvent, NodeIdentity};
use crate::ports::DiscoveryEventPublisher;
use crate::wire::MAX_PACKET_SIZE;

/// Requests from the session handle to its driver.
#[derive(Debug)]
pub(crate) enum Command {
    SetFallbackNodes(Vec<NodeIdentity>),
}

/// Owns the engine, the socket, the timer queue and the publisher.
///
/// Nothing else touches these. The session talks to the driver through
/// the command channel and stops it through the shutdown watch.
pub(crate) struct Driver {
    engine: DiscoveryEngine,
    socket: UdpSocket,
    local_addr: SocketAddr,
    timers: TimerQueue,
    publisher: Arc<dyn DiscoveryEventPublisher>,
    commands: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
}

impl Driver {
    pub(crate) fn new(
        engine: DiscoveryEngine,
        socket: UdpSocket,
        local_addr: SocketAddr,
        publisher: Arc<dyn DiscoveryEventPublisher>,
        commands: mpsc::Receiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            socket,
            local_addr,
            timers: TimerQueue::new(),
            publisher,
            commands,
            shutdown,
        }
    }

    /// Serve until shutdown is signalled or the session handle is dropped.
    pub(crate) async fn run(mut self) {
        let period = self.engine.config().refresh_interval;
        let mut refresh = interval_at(deadline_after(Instant::now(), period), period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut buf = vec![0u8; MAX_PACKET_SIZE];

        info!(
            node = %self.engine.local_identity().id().short(),
            addr = %self.local_addr,
            "Discovery session started"
        );

        loop {
            let next_timer = self.timers.next_deadline();

            tokio::select! {
                _ = self.shutdown.changed() => {
                    debug!("Shutdown signal received");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(Command::SetFallbackNodes(nodes)) => {
                        let outputs = self.engine.set_fallback_nodes(nodes);
                        self.dispatch(outputs).await;
                    }
                    None => {
                        debug!("Session handle dropped");
                        break;
                    }
                },
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => {
                        let outputs = self.engine.handle_datagram(from, &buf[..len]);
                        self.dispatch(outputs).await;
                    }
                    Err(err) => debug!(%err, "UDP read error"),
                },
                _ = wait_until(next_timer) => {
                    for timer in self.timers.pop_due(Instant::now()) {
                        let outputs = self.engine.handle_timer(timer);
                        self.dispatch(outputs).await;
                    }
                }
                _ = refresh.tick() => {
                    let outputs = self.engine.refresh();
                    self.dispatch(outputs).await;
                }
            }
        }

        info!(addr = %self.local_addr, "Discovery session stopped");
    }

    async fn dispatch(&mut self, outputs: Vec<EngineOutput>) {
        for output in outputs {
            match output {
                EngineOutput::Send { to, kind, packet } => {
                    match self.socket.send_to(&packet, self.outbound(to)).await {
                        Ok(_) => {
                            trace!(%kind, %to, len = packet.len(), "Packet sent");
                            self.publisher.publish(DiscoveryEvent::PacketSent { kind, to });
                        }
                        Err(err) => {
                            debug!(%kind, %to, %err, "Packet send failed");
                            self.publisher.publish(DiscoveryEvent::SendFailed {
                                kind,
                                to,
                                reason: err.to_string(),
                            });
                        }
                    }
                }
                EngineOutput::Arm { timer, after } => {
                    self.timers.arm(timer, deadline_after(Instant::now(), after));
                }
                EngineOutput::Event(event) => {
                    trace!(%event, "Discovery event");
                    self.publisher.publish(event);
                }
            }
        }
    }

    /// IPv4 peers are reached through their mapped form on a v6 socket.
    fn outbound(&self, to: SocketAddr) -> SocketAddr {
        match (self.local_addr.ip(), to.ip()) {
            (IpAddr::V6(_), IpAddr::V4(v4)) => {
                SocketAddr::new(IpAddr::V6(v4.to_ipv6_mapped()), to.port())
            }
            _ => to,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
