//! # disco-connect
//!
//! Probe a discovery v5 peer and exit 0 if it completes the handshake
//! within the deadline, 1 otherwise.
//!
//! ```text
//! disco-connect enode://<128 hex>@10.0.0.1:30303 --verbose
//! ```
//!
//! Exactly one verdict line goes to stdout. Logs go to stderr.

use std::future::pending;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use disco_connect::{
    init_tracing, ConfigOverrides, ProbeConfig, ProbeController, ProbeResult, TracingSink,
};
use disco_discovery::NodeIdentity;

const BANNER_DOWN: &str = "↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓";
const BANNER_UP: &str = "↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑";

/// Check whether a discovery v5 peer answers a ping/pong handshake.
#[derive(Debug, Parser)]
#[command(name = "disco-connect", version, about)]
struct Args {
    /// Target node descriptor: enode://<128 hex chars>@<ip>:<port>[?discport=<udp>]
    node: String,

    /// Print every discovery event and frame the success line
    #[arg(short, long)]
    verbose: bool,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Local UDP address to bind (default 0.0.0.0:11235)
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Seconds to wait for the handshake (default 30)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Only talk to peers in these subnets, e.g. "10.0.0.0/8,192.168.0.0/16"
    #[arg(long, value_name = "CIDRS")]
    restrict: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version are not failures.
            let code = u8::from(err.use_stderr());
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            println!("{err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<u8> {
    let target = NodeIdentity::parse(&args.node).context("parse node")?;

    if let Err(err) = init_tracing(args.verbose) {
        eprintln!("{err}");
    }

    let overrides = ConfigOverrides {
        listen_addr: args.listen,
        timeout_secs: args.timeout,
        restrict: args.restrict,
    };
    let config =
        ProbeConfig::resolve(args.config.as_deref(), &overrides).context("load config")?;

    info!(
        node = %target.id().short(),
        addr = %target.udp_addr(),
        listen = %config.session.listen_addr,
        "Probing"
    );

    let mut controller = ProbeController::new(target, config);
    if args.verbose {
        controller = controller.with_diagnostics(Arc::new(TracingSink));
    }

    let result = controller.run(shutdown_signal()).await;
    report(&result, args.verbose);
    Ok(result.exit_code())
}

fn report(result: &ProbeResult, verbose: bool) {
    let framed = verbose && result.is_success();
    if framed {
        println!("{BANNER_DOWN}");
    }
    println!("{result}");
    if framed {
        println!("{BANNER_UP}");
    }
}

/// Resolves with the name of the first exit signal received.
async fn shutdown_signal() -> String {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "interrupt".to_string(),
            Err(err) => {
                warn!(%err, "Cannot listen for Ctrl+C");
                pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "terminated".to_string()
            }
            Err(err) => {
                warn!(%err, "Cannot listen for SIGTERM");
                pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<String>();

    tokio::select! {
        reason = ctrl_c => reason,
        reason = terminate => reason,
    }
}
