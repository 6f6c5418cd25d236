//! End-to-end tests over real sockets.
//!
//! These tests wire the full chain on loopback with ephemeral ports:
//! `send ──tcp──▶ tcp-to-quic ──quic──▶ quic-to-tcp ──tcp──▶ sink`
#![allow(clippy::tests_outside_test_module)]

use std::net::SocketAddr;

use bytes::Bytes;
use quic_proxy_core::FramingMode;
use quic_proxy_relay::tools::{line_message, send, sink};
use quic_proxy_relay::{
    CancellationToken, ConfiguredRelay, RelayConfig, RelayError, RelayOutcome, RelayState,
    Topology,
};
use quic_proxy_transport::TransportListener;
use quic_proxy_transport::plain::PlainListener;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

// ============================================================================
// Helpers
// ============================================================================

fn loopback(topology: Topology, remote: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::for_topology(topology);
    config.ingress.listen_host = "127.0.0.1".into();
    config.ingress.listen_port = 0;
    config.egress.remote_host = "127.0.0.1".into();
    config.egress.remote_port = remote.port();
    config.timeouts.accept_timeout_secs = Some(10);
    config.timeouts.read_timeout_secs = Some(10);
    config.timeouts.dial_timeout_secs = Some(10);
    config
}

async fn start_sink() -> (SocketAddr, JoinHandle<Result<(SocketAddr, Bytes), RelayError>>) {
    let listener = PlainListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, tokio::spawn(sink(listener, 1024)))
}

async fn start_relay(
    config: RelayConfig,
) -> (SocketAddr, JoinHandle<(Result<RelayOutcome, RelayError>, RelayState)>) {
    let mut relay = ConfiguredRelay::bind(&config).await.unwrap();
    let addr = relay.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let result = relay.run(&CancellationToken::new()).await;
        (result, relay.state())
    });
    (addr, handle)
}

/// Sink, quic-to-tcp relay and tcp-to-quic relay, returning the entry address.
async fn start_chain(
    framing: FramingMode,
) -> (
    SocketAddr,
    JoinHandle<(Result<RelayOutcome, RelayError>, RelayState)>,
    JoinHandle<(Result<RelayOutcome, RelayError>, RelayState)>,
    JoinHandle<Result<(SocketAddr, Bytes), RelayError>>,
) {
    let (sink_addr, sink) = start_sink().await;

    let mut back = loopback(Topology::QuicToTcp, sink_addr);
    back.framing = framing;
    let (quic_addr, back) = start_relay(back).await;

    let mut front = loopback(Topology::TcpToQuic, quic_addr);
    front.framing = framing;
    front.egress.tls_insecure_skip_verify = true;
    let (entry_addr, front) = start_relay(front).await;

    (entry_addr, front, back, sink)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn delimited_message_crosses_tcp_quic_tcp_chain() {
    let (entry, front, back, sink) = start_chain(FramingMode::delimited()).await;

    send(&entry.to_string(), line_message("hello")).await.unwrap();

    let (front_result, front_state) = front.await.unwrap();
    assert_eq!(front_result.unwrap().bytes, 6);
    assert_eq!(front_state, RelayState::Done);

    let (back_result, back_state) = back.await.unwrap();
    assert_eq!(back_result.unwrap().bytes, 6);
    assert_eq!(back_state, RelayState::Done);

    let (_, received) = sink.await.unwrap().unwrap();
    assert_eq!(&received[..], b"hello\n");
}

#[tokio::test]
async fn fixed_message_crosses_chain_unchanged() {
    let (entry, front, back, sink) = start_chain(FramingMode::fixed(10)).await;

    let mut client = TcpStream::connect(entry).await.unwrap();
    client.write_all(b"\x00\x01binary\xff\n").await.unwrap();
    client.shutdown().await.unwrap();

    assert_eq!(front.await.unwrap().0.unwrap().bytes, 10);
    assert_eq!(back.await.unwrap().0.unwrap().bytes, 10);

    let (_, received) = sink.await.unwrap().unwrap();
    assert_eq!(&received[..], b"\x00\x01binary\xff\n");
}

#[tokio::test]
async fn unreachable_egress_fails_dial() {
    // Reserve a port, then free it so nothing is listening there.
    let closed = PlainListener::bind("127.0.0.1:0").await.unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);

    let mut config = loopback(Topology::QuicToTcp, closed_addr);
    config.ingress.transport = quic_proxy_relay::TransportKind::Plain;
    let (entry, relay) = start_relay(config).await;

    send(&entry.to_string(), line_message("lost")).await.unwrap();

    let (result, state) = relay.await.unwrap();
    let err = result.unwrap_err();
    assert!(matches!(err, RelayError::Dial { .. }), "got {err:?}");
    assert!(err.diagnostic().starts_with("dial failed: "));
    assert_eq!(state, RelayState::Failed);
}

#[tokio::test]
async fn verified_quic_egress_rejects_self_signed_peer() {
    let (sink_addr, _sink) = start_sink().await;
    let (quic_addr, _back) = start_relay(loopback(Topology::QuicToTcp, sink_addr)).await;

    // Verification is on unless explicitly disabled.
    let front = loopback(Topology::TcpToQuic, quic_addr);
    assert!(!front.egress.tls_insecure_skip_verify);
    let (entry, front) = start_relay(front).await;

    send(&entry.to_string(), line_message("hello")).await.unwrap();

    let (result, state) = front.await.unwrap();
    let err = result.unwrap_err();
    assert_eq!(err.stage(), "dial", "got {err:?}");
    assert_eq!(state, RelayState::Failed);
}

#[tokio::test]
async fn empty_connection_is_stream_closed() {
    let (sink_addr, _sink) = start_sink().await;
    let mut config = loopback(Topology::TcpToQuic, sink_addr);
    config.egress.transport = quic_proxy_relay::TransportKind::Plain;
    let (entry, relay) = start_relay(config).await;

    drop(TcpStream::connect(entry).await.unwrap());

    let (result, _) = relay.await.unwrap();
    assert_eq!(
        result.unwrap_err().diagnostic(),
        "read failed: stream closed before any data was received"
    );
}
