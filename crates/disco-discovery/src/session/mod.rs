//! # Discovery Session
//!
//! One ephemeral identity, one bound UDP socket, one engine driver task.
//!
//! ```rust,ignore
//! let session = DiscoverySession::start(SessionConfig::default()).await?;
//! let mut events = session.subscribe();
//! session.set_fallback_nodes(vec![target]).await?;
//! while let Some(event) = events.recv().await { /* ... */ }
//! session.shutdown().await;
//! ```
//!
//! Shutting down (or dropping) the session stops the driver, which closes
//! the socket.

mod key;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapters::{BroadcastEventPublisher, EventSubscription, SystemTimeSource};
use crate::domain::{Netlist, NodeIdentity};
use crate::engine::driver::{Command, Driver};
use crate::engine::{DiscoveryEngine, EngineConfig};
use crate::ports::TimeSource;

/// Fixed discovery port the probe listens on unless told otherwise.
pub const DEFAULT_LISTEN_PORT: u16 = 11235;

/// `0.0.0.0:11235`
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT));

const COMMAND_CAPACITY: usize = 16;

/// Why a session could not be started or used.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No local key could be generated.
    #[error("failed to generate node key: {0}")]
    KeyGeneration(String),

    /// The driver task has already stopped.
    #[error("discovery session closed")]
    SessionClosed,
}

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Local UDP address to bind
    pub listen_addr: SocketAddr,
    /// Optional allow-list of peer subnets
    pub restrict: Option<Netlist>,
    /// Engine timers and bounds
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            restrict: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Handle to a running discovery session.
pub struct DiscoverySession {
    local: NodeIdentity,
    local_addr: SocketAddr,
    publisher: BroadcastEventPublisher,
    commands: mpsc::Sender<Command>,
    shutdown: watch::Sender<bool>,
    driver: Option<JoinHandle<()>>,
}

impl DiscoverySession {
    /// Generate a key, bind the socket and spawn the driver.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(config: SessionConfig) -> Result<Self, StartupError> {
        Self::start_with_time_source(config, Box::new(SystemTimeSource::new())).await
    }

    /// As [`start`](Self::start), with an explicit clock for packet expirations.
    pub async fn start_with_time_source(
        config: SessionConfig,
        time_source: Box<dyn TimeSource>,
    ) -> Result<Self, StartupError> {
        let key = key::generate_key()?;

        let socket = UdpSocket::bind(config.listen_addr)
            .await
            .map_err(|source| StartupError::Bind {
                addr: config.listen_addr,
                source,
            })?;
        let local_addr = socket.local_addr().map_err(|source| StartupError::Bind {
            addr: config.listen_addr,
            source,
        })?;

        let engine = DiscoveryEngine::new(
            key,
            local_addr,
            config.engine.clone(),
            config.restrict.clone(),
            time_source,
        );
        let local = *engine.local_identity();

        let publisher = BroadcastEventPublisher::new(config.engine.event_capacity);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = Driver::new(
            engine,
            socket,
            local_addr,
            Arc::new(publisher.clone()),
            command_rx,
            shutdown_rx,
        );
        let handle = tokio::spawn(driver.run());

        debug!(node = %local.id().short(), %local_addr, "Discovery session bound");

        Ok(Self {
            local,
            local_addr,
            publisher,
            commands: command_tx,
            shutdown: shutdown_tx,
            driver: Some(handle),
        })
    }

    /// Our ephemeral identity.
    pub fn local_identity(&self) -> &NodeIdentity {
        &self.local
    }

    /// Address the socket is bound to, with the real port if 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> EventSubscription {
        self.publisher.subscribe()
    }

    /// Replace the fallback peers; the driver seeds them at once.
    pub async fn set_fallback_nodes(&self, nodes: Vec<NodeIdentity>) -> Result<(), StartupError> {
        self.commands
            .send(Command::SetFallbackNodes(nodes))
            .await
            .map_err(|_| StartupError::SessionClosed)
    }

    /// True while the driver task is alive.
    pub fn is_running(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the driver and wait for it, releasing the socket.
    pub async fn shutdown(mut self) {
        // The driver may already be gone; nothing to signal then.
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.driver.take() {
            if let Err(err) = handle.await {
                warn!(%err, "Discovery driver ended abnormally");
            }
        }
    }
}

impl Drop for DiscoverySession {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.take() {
            handle.abort();
        }
    }
}
