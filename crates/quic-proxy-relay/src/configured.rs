//! Relay assembled from a [`RelayConfig`].
//!
//! Validates the configuration, generates the session credential when the
//! ingress is QUIC, builds the egress connector and binds the listener. The
//! four ingress/egress combinations share the generic [`Relay`].

use std::net::SocketAddr;

use quic_proxy_transport::plain::{PlainListener, PlainTransportConnector};
use quic_proxy_transport::quic::{QuicListener, QuicTransportConnector};
use quic_proxy_transport::tls::{
    PeerVerification, SessionCredential, build_client_tls_config, build_server_tls_config,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{EgressConfig, IngressConfig, RelayConfig, TransportKind, validate_config};
use crate::error::RelayError;
use crate::pipeline::{Relay, RelayOutcome, RelayState, StageDeadlines};

/// A bound relay for any combination of ingress and egress transports.
pub enum ConfiguredRelay {
    PlainToPlain(Relay<PlainListener, PlainTransportConnector>),
    PlainToQuic(Relay<PlainListener, QuicTransportConnector>),
    QuicToPlain(Relay<QuicListener, PlainTransportConnector>),
    QuicToQuic(Relay<QuicListener, QuicTransportConnector>),
}

enum Ingress {
    Plain(PlainListener),
    Quic(QuicListener),
}

enum Egress {
    Plain(PlainTransportConnector),
    Quic(QuicTransportConnector),
}

impl ConfiguredRelay {
    /// Validate `config` and bind the ingress listener.
    ///
    /// On success the relay is [`RelayState::Idle`] and ready to run.
    pub async fn bind(config: &RelayConfig) -> Result<Self, RelayError> {
        validate_config(config)?;

        let egress = build_egress(config)?;
        let ingress = bind_ingress(&config.ingress).await?;

        let remote = config.egress.remote_addr();
        let framing = config.framing;
        let deadlines = StageDeadlines::from(&config.timeouts);

        let relay = match (ingress, egress) {
            (Ingress::Plain(l), Egress::Plain(c)) => {
                Self::PlainToPlain(Relay::new(l, c, remote, framing, deadlines))
            }
            (Ingress::Plain(l), Egress::Quic(c)) => {
                Self::PlainToQuic(Relay::new(l, c, remote, framing, deadlines))
            }
            (Ingress::Quic(l), Egress::Plain(c)) => {
                Self::QuicToPlain(Relay::new(l, c, remote, framing, deadlines))
            }
            (Ingress::Quic(l), Egress::Quic(c)) => {
                Self::QuicToQuic(Relay::new(l, c, remote, framing, deadlines))
            }
        };

        info!(
            listen = ?relay.local_addr(),
            ingress = config.ingress.transport.name(),
            remote = %config.egress.remote_addr(),
            egress = config.egress.transport.name(),
            framing = config.framing.name(),
            "relay listening"
        );
        Ok(relay)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::PlainToPlain(r) => r.local_addr(),
            Self::PlainToQuic(r) => r.local_addr(),
            Self::QuicToPlain(r) => r.local_addr(),
            Self::QuicToQuic(r) => r.local_addr(),
        }
    }

    pub fn state(&self) -> RelayState {
        match self {
            Self::PlainToPlain(r) => r.state(),
            Self::PlainToQuic(r) => r.state(),
            Self::QuicToPlain(r) => r.state(),
            Self::QuicToQuic(r) => r.state(),
        }
    }

    /// Relay one message. A relay runs at most once.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> Result<RelayOutcome, RelayError> {
        match self {
            Self::PlainToPlain(r) => r.run(shutdown).await,
            Self::PlainToQuic(r) => r.run(shutdown).await,
            Self::QuicToPlain(r) => r.run(shutdown).await,
            Self::QuicToQuic(r) => r.run(shutdown).await,
        }
    }
}

/// Bind, then relay one message.
pub async fn run(config: &RelayConfig, shutdown: &CancellationToken) -> Result<RelayOutcome, RelayError> {
    let mut relay = ConfiguredRelay::bind(config).await?;
    relay.run(shutdown).await
}

async fn bind_ingress(config: &IngressConfig) -> Result<Ingress, RelayError> {
    let addr = config.listen_addr();
    match config.transport {
        TransportKind::Plain => PlainListener::bind(&addr)
            .await
            .map(Ingress::Plain)
            .map_err(|source| RelayError::Bind { addr, source }),
        TransportKind::Quic => {
            let credential = SessionCredential::generate(&config.server_name, config.key_algorithm)
                .map_err(RelayError::CredentialGeneration)?;
            debug!(?credential, server_name = %config.server_name, "session credential generated");

            let tls = build_server_tls_config(&credential).map_err(RelayError::CredentialGeneration)?;
            QuicListener::bind(&addr, tls)
                .await
                .map(Ingress::Quic)
                .map_err(|source| RelayError::Bind { addr, source })
        }
    }
}

fn build_egress(config: &RelayConfig) -> Result<Egress, RelayError> {
    let egress: &EgressConfig = &config.egress;
    match egress.transport {
        TransportKind::Plain => Ok(Egress::Plain(PlainTransportConnector::new())),
        TransportKind::Quic => {
            let verification = PeerVerification::from_insecure_flag(egress.tls_insecure_skip_verify);
            if verification == PeerVerification::InsecureSkipVerify {
                warn!("QUIC peer certificate verification is disabled");
            }
            let tls = build_client_tls_config(verification).map_err(RelayError::CredentialGeneration)?;
            let connector = QuicTransportConnector::new(tls, egress.server_name.clone())
                .map_err(RelayError::CredentialGeneration)?
                .with_drain_timeout(config.timeouts.quic_drain());
            Ok(Egress::Quic(connector))
        }
    }
}
