//! Connection state and the supervised pump pair.

use std::fmt;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::buffer::{DEFAULT_BUFFER_DEPTH, outbound_buffer};
use super::inbound::{InboundExit, InboundPump};
use super::liveness::LivenessPolicy;
use super::outbound::{OutboundExit, OutboundPump};
use crate::errors::ServerError;
use crate::transport::{CloseHandle, FrameSink, FrameSource, Transport};

/// Unique connection identifier, used for log correlation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl Default for ConnectionId {
    fn default() -> Self {
        Self(format!("conn_{}", Uuid::now_v7()))
    }
}

impl ConnectionId {
    /// Fresh, time-ordered id.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An accepted duplex session whose pumps have not started yet.
pub struct Connection<R, W> {
    id: ConnectionId,
    transport: Transport<R, W>,
    buffer_depth: usize,
}

impl<R: FrameSource, W: FrameSink> Connection<R, W> {
    /// Wrap an established transport.
    pub fn new(id: ConnectionId, transport: Transport<R, W>) -> Self {
        Self {
            id,
            transport,
            buffer_depth: DEFAULT_BUFFER_DEPTH,
        }
    }

    /// Set the outbound buffer depth (`0` behaves like `1`).
    #[must_use]
    pub fn with_buffer_depth(mut self, depth: usize) -> Self {
        self.buffer_depth = depth;
        self
    }

    /// Handle that closes the transport; both pumps wind down after it fires.
    pub fn close_handle(&self) -> CloseHandle {
        self.transport.close_handle()
    }

    /// Start the inbound and outbound pumps on their own tasks.
    ///
    /// Consumes the connection, so each pump runs exactly once.
    pub fn start(self, policy: LivenessPolicy) -> PumpPair {
        let (tx, rx) = outbound_buffer(self.buffer_depth);
        let (reader, writer) = self.transport.into_parts();

        let inbound = InboundPump::new(self.id.clone(), reader, tx, &policy);
        let outbound = OutboundPump::new(self.id.clone(), writer, rx, policy);
        debug!(connection_id = %self.id, buffer_depth = self.buffer_depth, "starting pumps");

        PumpPair {
            id: self.id,
            started_at: Instant::now(),
            inbound: tokio::spawn(inbound.run()),
            outbound: tokio::spawn(outbound.run()),
        }
    }
}

/// The two running pumps of one connection.
///
/// Awaiting it only observes the exits. Dropping it detaches the tasks; they
/// still end on their own once the transport or the buffer closes.
pub struct PumpPair {
    id: ConnectionId,
    started_at: Instant,
    inbound: JoinHandle<InboundExit>,
    outbound: JoinHandle<OutboundExit>,
}

impl PumpPair {
    /// Wait for both pumps to exit.
    pub async fn join(self) -> Result<ConnectionReport, ServerError> {
        let (inbound, outbound) = tokio::join!(self.inbound, self.outbound);
        Ok(ConnectionReport {
            id: self.id,
            inbound: inbound.map_err(|e| aborted("inbound", &e))?,
            outbound: outbound.map_err(|e| aborted("outbound", &e))?,
            lifetime: self.started_at.elapsed(),
        })
    }
}

fn aborted(pump: &'static str, err: &JoinError) -> ServerError {
    ServerError::PumpAborted {
        pump,
        message: err.to_string(),
    }
}

/// How a connection ended.
#[derive(Debug)]
pub struct ConnectionReport {
    /// Connection id.
    pub id: ConnectionId,
    /// Why the inbound pump stopped.
    pub inbound: InboundExit,
    /// Why the outbound pump stopped.
    pub outbound: OutboundExit,
    /// Time from start until both pumps had exited.
    pub lifetime: Duration,
}
