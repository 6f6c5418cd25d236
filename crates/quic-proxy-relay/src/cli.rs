//! CLI module for quic-proxy relays and companion tools.
//!
//! Each entry point returns a [`RelayError`], so the binary can print the
//! stage-prefixed diagnostic and choose the exit code.

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser};
use quic_proxy_core::defaults::{DEFAULT_LISTEN_HOST, DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_REMOTE_HOST, DEFAULT_TCP_PORT};
use quic_proxy_transport::plain::PlainListener;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{
    CliOverrides, LoggingConfig, RelayConfig, Topology, apply_overrides, join_host_port,
    load_config,
};
use crate::error::RelayError;
use crate::tools;

/// Arguments for the stock topologies (`tcp-to-quic`, `quic-to-tcp`).
#[derive(Args, Debug, Clone)]
pub struct TopologyArgs {
    /// Optional config file (toml); the topology defaults apply otherwise.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Arguments for a fully configured relay.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Config file path (toml).
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Arguments for the `send` tool.
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Remote host to dial.
    #[arg(long, default_value = DEFAULT_REMOTE_HOST)]
    pub host: String,

    /// Remote port to dial.
    #[arg(long, default_value_t = DEFAULT_TCP_PORT)]
    pub port: u16,

    /// Message to send; one line is read from stdin when absent.
    #[arg(short, long)]
    pub message: Option<String>,

    /// Log level override (e.g. "info", "debug", "trace").
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Arguments for the `sink` tool.
#[derive(Parser, Debug, Clone)]
pub struct SinkArgs {
    /// Host to listen on.
    #[arg(long, default_value = DEFAULT_LISTEN_HOST)]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = DEFAULT_TCP_PORT)]
    pub port: u16,

    /// Largest accepted payload (bytes).
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_bytes: usize,

    /// Log level override (e.g. "info", "debug", "trace").
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Run one of the stock topologies.
pub async fn run_topology(topology: Topology, args: TopologyArgs) -> Result<(), RelayError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::for_topology(topology),
    };
    run_relay(config, &args.overrides).await
}

/// Run a relay described entirely by a config file.
pub async fn run(args: RunArgs) -> Result<(), RelayError> {
    let config = load_config(&args.config)?;
    run_relay(config, &args.overrides).await
}

async fn run_relay(mut config: RelayConfig, overrides: &CliOverrides) -> Result<(), RelayError> {
    apply_overrides(&mut config, overrides);
    init_tracing(&config.logging);

    // Set up graceful shutdown on SIGTERM/SIGINT
    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    crate::configured::run(&config, &shutdown).await?;
    Ok(())
}

/// Send one message to a plain TCP endpoint.
pub async fn send(args: SendArgs) -> Result<(), RelayError> {
    init_tracing(&level_only(args.log_level));

    let message = match &args.message {
        Some(text) => tools::line_message(text),
        None => {
            info!("reading one line from stdin");
            let mut stdin = BufReader::new(tokio::io::stdin());
            tools::read_line_message(&mut stdin).await?
        }
    };
    tools::send(&join_host_port(&args.host, args.port), message).await?;
    Ok(())
}

/// Receive one connection's bytes on a plain TCP endpoint.
pub async fn sink(args: SinkArgs) -> Result<(), RelayError> {
    init_tracing(&level_only(args.log_level));

    let addr = join_host_port(&args.host, args.port);
    let listener = PlainListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(listen = %addr, "sink listening");
    tools::sink(listener, args.max_bytes).await?;
    Ok(())
}

fn level_only(level: Option<String>) -> LoggingConfig {
    LoggingConfig {
        level,
        ..LoggingConfig::default()
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            // Fall back to waiting forever
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Initialize tracing subscriber with the given logging configuration.
///
/// Supports:
/// - `level`: Base log level (trace, debug, info, warn, error)
/// - `format`: Output format (json, pretty, compact). Default: pretty
/// - `output`: Output target (stdout, stderr). Default: stderr
/// - `filters`: Per-module log level overrides
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = config.format.as_deref().unwrap_or("pretty");
    let output = config.output.as_deref().unwrap_or("stderr");

    let result = match (format, output) {
        ("json", "stdout") => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stdout))
            .try_init(),
        ("json", _) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init(),
        ("compact", "stdout") => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(io::stdout))
            .try_init(),
        ("compact", _) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(io::stderr))
            .try_init(),
        (_, "stdout") => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stdout))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}

/// Base level followed by per-module overrides, in `EnvFilter` syntax.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.level.as_deref().unwrap_or("info").to_string();

    let mut modules: Vec<_> = config.filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        directives.push(',');
        directives.push_str(module);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}
