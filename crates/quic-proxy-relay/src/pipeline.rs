//! Single-shot relay orchestration.
//!
//! A [`Relay`] owns one bound listener and one connector. Running it:
//! 1. Accepts exactly one inbound stream (the listener is consumed)
//! 2. Reads one framed message from it
//! 3. Dials the egress endpoint and opens one stream
//! 4. Writes the message once, in full, then finishes the stream
//!
//! Progress is tracked as a [`RelayState`]. Every stage can be bounded by an
//! optional deadline and is abandoned when the shutdown token fires.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use quic_proxy_core::errors::{
    STAGE_ACCEPT, STAGE_DIAL, STAGE_FINISH, STAGE_READ, STAGE_STREAM_OPEN, STAGE_WRITE,
};
use quic_proxy_core::{FramingMode, read_message, write_message};
use quic_proxy_transport::{Accepted, TransportConnector, TransportListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TimeoutConfig;
use crate::error::RelayError;

/// Where a relay is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Configured and bound, not yet started.
    Idle,
    /// Waiting for the inbound connection and its message.
    Listening,
    /// A message has been read.
    Received,
    /// The egress stream is open and the message is being written.
    Forwarding,
    /// The message was written in full.
    Done,
    /// A stage failed; see the error returned by [`Relay::run`].
    Failed,
}

impl RelayState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Optional deadline per stage. `None` waits indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageDeadlines {
    pub accept: Option<Duration>,
    pub read: Option<Duration>,
    /// Applies to the dial and to opening the stream.
    pub dial: Option<Duration>,
    /// Applies to the write and to finishing the stream.
    pub write: Option<Duration>,
}

impl From<&TimeoutConfig> for StageDeadlines {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            accept: config.accept(),
            read: config.read(),
            dial: config.dial(),
            write: config.write(),
        }
    }
}

/// Summary of a completed relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Peer that sent the message.
    pub peer: SocketAddr,
    /// Bytes written to the egress stream.
    pub bytes: usize,
}

/// A relay from one bound listener to one egress address.
pub struct Relay<L, C>
where
    L: TransportListener,
    C: TransportConnector,
{
    listener: Option<L>,
    local_addr: Option<SocketAddr>,
    connector: C,
    remote_addr: String,
    framing: FramingMode,
    deadlines: StageDeadlines,
    state: RelayState,
}

impl<L, C> Relay<L, C>
where
    L: TransportListener,
    C: TransportConnector,
{
    pub fn new(
        listener: L,
        connector: C,
        remote_addr: impl Into<String>,
        framing: FramingMode,
        deadlines: StageDeadlines,
    ) -> Self {
        let local_addr = listener.local_addr().ok();
        Self {
            listener: Some(listener),
            local_addr,
            connector,
            remote_addr: remote_addr.into(),
            framing,
            deadlines,
            state: RelayState::Idle,
        }
    }

    /// Address the ingress listener is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Relay one message. A relay runs at most once.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> Result<RelayOutcome, RelayError> {
        if self.state != RelayState::Idle {
            return Err(RelayError::AlreadyRun);
        }
        let listener = self.listener.take().ok_or(RelayError::AlreadyRun)?;

        let result = self.drive(listener, shutdown).await;
        match &result {
            Ok(outcome) => {
                self.enter(RelayState::Done);
                info!(peer = %outcome.peer, bytes = outcome.bytes, "relay complete");
            }
            Err(RelayError::Cancelled { stage }) => {
                self.enter(RelayState::Failed);
                warn!(stage, "relay cancelled");
            }
            Err(e) => {
                self.enter(RelayState::Failed);
                warn!(stage = e.stage(), error = %e, "relay failed");
            }
        }
        result
    }

    async fn drive(
        &mut self,
        listener: L,
        shutdown: &CancellationToken,
    ) -> Result<RelayOutcome, RelayError> {
        let deadlines = self.deadlines;
        self.enter(RelayState::Listening);

        let Accepted { mut stream, peer } =
            guard(STAGE_ACCEPT, deadlines.accept, shutdown, listener.accept_one())
                .await?
                .map_err(RelayError::Accept)?;
        info!(%peer, "connection accepted");

        let message = guard(
            STAGE_READ,
            deadlines.read,
            shutdown,
            read_message(&mut stream, self.framing),
        )
        .await??;
        self.enter(RelayState::Received);
        info!(
            %peer,
            framing = self.framing.name(),
            bytes = message.len(),
            message = %message.log_form(),
            "message received"
        );

        let remote = self.remote_addr.clone();
        let session = guard(STAGE_DIAL, deadlines.dial, shutdown, self.connector.connect(&remote))
            .await?
            .map_err(|source| RelayError::Dial {
                addr: remote.clone(),
                source,
            })?;
        let mut outbound = guard(
            STAGE_STREAM_OPEN,
            deadlines.dial,
            shutdown,
            self.connector.open_stream(session),
        )
        .await?
        .map_err(RelayError::StreamOpen)?;
        self.enter(RelayState::Forwarding);
        debug!(%remote, "egress stream open");

        let bytes = guard(
            STAGE_WRITE,
            deadlines.write,
            shutdown,
            write_message(&mut outbound, message),
        )
        .await?
        .map_err(RelayError::Write)?;

        guard(
            STAGE_FINISH,
            deadlines.write,
            shutdown,
            self.connector.finish(outbound),
        )
        .await?
        .map_err(RelayError::Finish)?;

        // Inbound is released only after the egress side has finished.
        drop(stream);
        Ok(RelayOutcome { peer, bytes })
    }

    fn enter(&mut self, next: RelayState) {
        info!(from = ?self.state, to = ?next, "relay state");
        self.state = next;
    }
}

/// Run `fut` under an optional deadline, abandoning it on shutdown.
async fn guard<F>(
    stage: &'static str,
    deadline: Option<Duration>,
    shutdown: &CancellationToken,
    fut: F,
) -> Result<F::Output, RelayError>
where
    F: Future,
{
    let bounded = async {
        match deadline {
            Some(after) => tokio::time::timeout(after, fut)
                .await
                .map_err(|_| RelayError::Timeout { stage, after }),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(RelayError::Cancelled { stage }),
        result = bounded => result,
    }
}
