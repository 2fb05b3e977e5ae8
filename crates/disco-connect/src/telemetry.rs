//! Log output for the probe binary.
//!
//! Logs go to stderr so stdout carries only the verdict line.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used without `--verbose` when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Filter used with `--verbose`; shows every diagnostic event.
pub const VERBOSE_LOG_FILTER: &str = "trace";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed.
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Filter for the given verbosity. `RUST_LOG` wins unless verbose.
pub fn build_filter(verbose: bool) -> Result<EnvFilter, TelemetryError> {
    if verbose {
        return EnvFilter::try_new(VERBOSE_LOG_FILTER)
            .map_err(|e| TelemetryError::Filter(e.to_string()));
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Install the global subscriber.
pub fn init_tracing(verbose: bool) -> Result<(), TelemetryError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(build_filter(verbose)?);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))
}
