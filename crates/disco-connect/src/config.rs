//! Probe configuration.
//!
//! Layers, later ones winning field by field:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. `DISCO_LISTEN_ADDR`, `DISCO_TIMEOUT_SECS`, `DISCO_RESTRICT`
//! 4. command-line flags
//!
//! # Config File Format
//!
//! Every key is optional.
//!
//! ```toml
//! [probe]
//! listen_addr = "0.0.0.0:11235"
//! timeout_secs = 30
//! restrict = "10.0.0.0/8, 192.168.0.0/16"
//!
//! [engine]
//! response_timeout_ms = 500
//! packet_expiration_secs = 20
//! refresh_interval_secs = 10
//! max_tracked_nodes = 64
//! event_capacity = 1024
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use disco_discovery::{Netlist, SessionConfig, MAX_EVENT_CAPACITY};
use serde::Deserialize;
use thiserror::Error;

/// Hard ceiling on a probe run unless configured otherwise.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest accepted probe timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;
/// Longest accepted pong/ping wait, in milliseconds.
pub const MAX_RESPONSE_TIMEOUT_MS: u64 = 60_000;
/// Longest accepted refresh interval or packet lifetime, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 86_400;
/// Largest accepted node table.
pub const MAX_TRACKED_NODES: u64 = 4_096;

/// Environment variable overriding the listen address.
pub const ENV_LISTEN_ADDR: &str = "DISCO_LISTEN_ADDR";
/// Environment variable overriding the timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "DISCO_TIMEOUT_SECS";
/// Environment variable overriding the restrict netlist.
pub const ENV_RESTRICT: &str = "DISCO_RESTRICT";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidValue {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Everything one probe run needs besides the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Discovery session parameters
    pub session: SessionConfig,
    /// Deadline for the handshake, from probe start
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// `--listen`
    pub listen_addr: Option<SocketAddr>,
    /// `--timeout`
    pub timeout_secs: Option<u64>,
    /// `--restrict`
    pub restrict: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    probe: ProbeSection,
    #[serde(default)]
    engine: EngineSection,
}

#[derive(Debug, Deserialize, Default)]
struct ProbeSection {
    listen_addr: Option<String>,
    timeout_secs: Option<u64>,
    restrict: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct EngineSection {
    response_timeout_ms: Option<u64>,
    packet_expiration_secs: Option<u64>,
    refresh_interval_secs: Option<u64>,
    max_tracked_nodes: Option<usize>,
    event_capacity: Option<usize>,
}

impl ProbeConfig {
    /// Defaults, then `file` if given, then the process environment, then `overrides`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or any layer
    /// carries an unacceptable value.
    pub fn resolve(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides)?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys keep their defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();

        let probe = file.probe;
        if let Some(addr) = probe.listen_addr {
            config.session.listen_addr = parse_listen_addr(&addr)?;
        }
        if let Some(secs) = probe.timeout_secs {
            config.timeout = timeout_from_secs(secs)?;
        }
        if let Some(restrict) = probe.restrict {
            config.session.restrict = parse_restrict(&restrict)?;
        }

        let ec = file.engine;
        let engine = &mut config.session.engine;
        if let Some(ms) = ec.response_timeout_ms {
            let ms = bounded("response_timeout_ms", ms, MAX_RESPONSE_TIMEOUT_MS)?;
            engine.response_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = ec.packet_expiration_secs {
            let secs = bounded("packet_expiration_secs", secs, MAX_INTERVAL_SECS)?;
            engine.packet_expiration = Duration::from_secs(secs);
        }
        if let Some(secs) = ec.refresh_interval_secs {
            let secs = bounded("refresh_interval_secs", secs, MAX_INTERVAL_SECS)?;
            engine.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(max) = ec.max_tracked_nodes {
            engine.max_tracked_nodes = bounded_usize("max_tracked_nodes", max, MAX_TRACKED_NODES)?;
        }
        if let Some(capacity) = ec.event_capacity {
            engine.event_capacity =
                bounded_usize("event_capacity", capacity, MAX_EVENT_CAPACITY as u64)?;
        }

        Ok(config)
    }

    /// Apply `DISCO_*` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_LISTEN_ADDR) {
            self.session.listen_addr = parse_listen_addr(&addr)?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let parsed = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS,
                value: secs.clone(),
                reason: "not a whole number of seconds".to_string(),
            })?;
            self.timeout = timeout_from_secs(parsed)?;
        }
        if let Some(restrict) = lookup(ENV_RESTRICT) {
            self.session.restrict = parse_restrict(&restrict)?;
        }
        Ok(())
    }

    /// Apply command-line values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(addr) = overrides.listen_addr {
            self.session.listen_addr = addr;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = timeout_from_secs(secs)?;
        }
        if let Some(restrict) = &overrides.restrict {
            self.session.restrict = parse_restrict(restrict)?;
        }
        Ok(())
    }
}

fn parse_listen_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|err: std::net::AddrParseError| ConfigError::InvalidValue {
            field: "listen_addr",
            value: value.to_string(),
            reason: err.to_string(),
        })
}

/// Empty means no restriction.
fn parse_restrict(value: &str) -> Result<Option<Netlist>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    value
        .parse::<Netlist>()
        .map(Some)
        .map_err(|err| ConfigError::InvalidValue {
            field: "restrict",
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn timeout_from_secs(secs: u64) -> Result<Duration, ConfigError> {
    bounded("timeout_secs", secs, MAX_TIMEOUT_SECS).map(Duration::from_secs)
}

/// Accepts `1..=max`.
fn bounded(field: &'static str, value: u64, max: u64) -> Result<u64, ConfigError> {
    let reason = if value == 0 {
        "must be greater than zero".to_string()
    } else if value > max {
        format!("must be at most {max}")
    } else {
        return Ok(value);
    };
    Err(ConfigError::InvalidValue {
        field,
        value: value.to_string(),
        reason,
    })
}

fn bounded_usize(field: &'static str, value: usize, max: u64) -> Result<usize, ConfigError> {
    let value = u64::try_from(value).unwrap_or(u64::MAX);
    // `max` is far below `usize::MAX` on every supported target.
    bounded(field, value, max).map(|v| v as usize)
}
