//! quic-proxy CLI.
//!
//! This binary bridges one message between plain TCP and QUIC:
//! - `quic-proxy tcp-to-quic` - Accept on TCP, forward over QUIC
//! - `quic-proxy quic-to-tcp` - Accept on QUIC, forward over TCP
//! - `quic-proxy run` - Any combination, from a config file
//! - `quic-proxy send` / `quic-proxy sink` - Plain TCP endpoints for driving a chain

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quic_proxy_core::{PROJECT_NAME, VERSION};
use quic_proxy_relay::Topology;
use quic_proxy_relay::cli::{RunArgs, SendArgs, SinkArgs, TopologyArgs};

/// quic-proxy unified CLI.
#[derive(Parser)]
#[command(
    name = PROJECT_NAME,
    version = VERSION,
    about = "Relay a single message between plain TCP and QUIC",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept one TCP connection and forward its message over QUIC.
    #[command(name = "tcp-to-quic")]
    TcpToQuic(TopologyArgs),

    /// Accept one QUIC stream and forward its message over TCP.
    #[command(name = "quic-to-tcp")]
    QuicToTcp(TopologyArgs),

    /// Run a relay described by a config file.
    #[command(name = "run")]
    Run(RunArgs),

    /// Send one line to a plain TCP endpoint.
    #[command(name = "send")]
    Send(SendArgs),

    /// Accept one plain TCP connection and log what it sends.
    #[command(name = "sink")]
    Sink(SinkArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::TcpToQuic(args) => {
            quic_proxy_relay::cli::run_topology(Topology::TcpToQuic, args).await
        }
        Commands::QuicToTcp(args) => {
            quic_proxy_relay::cli::run_topology(Topology::QuicToTcp, args).await
        }
        Commands::Run(args) => quic_proxy_relay::cli::run(args).await,
        Commands::Send(args) => quic_proxy_relay::cli::send(args).await,
        Commands::Sink(args) => quic_proxy_relay::cli::sink(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.diagnostic());
            ExitCode::FAILURE
        }
    }
}
