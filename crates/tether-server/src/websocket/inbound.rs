//! Inbound pump: reads frames from the peer until a read fails.
//!
//! Data frames are forwarded to the outbound buffer, so the outbound pump
//! writes them back to the same peer. Pongs renew the liveness deadline.
//! Every read is bounded by that deadline, and a forward waiting on a full
//! buffer gives up as soon as the transport is closed.
//!
//! On exit the pump closes the transport and then drops its buffer sender,
//! which is what unblocks an outbound pump waiting on the buffer.

use std::fmt;

use tokio::time;
use tracing::{debug, info, instrument, warn};

use super::buffer::BufferSender;
use super::connection::ConnectionId;
use super::liveness::{LivenessDeadline, LivenessPolicy};
use crate::transport::{Frame, FrameSource, TransportError, TransportReader};

/// Why the inbound pump stopped.
#[derive(Debug)]
pub enum InboundExit {
    /// No pong arrived before the liveness deadline.
    DeadlineElapsed,
    /// The peer sent a close frame.
    PeerClosed,
    /// The transport was closed by the outbound pump.
    TransportClosed,
    /// The outbound pump is gone, so there is nowhere to forward data.
    BufferClosed,
    /// The read failed (peer vanished, protocol error).
    ReadFailed(TransportError),
}

impl fmt::Display for InboundExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineElapsed => write!(f, "liveness deadline elapsed"),
            Self::PeerClosed => write!(f, "peer closed"),
            Self::TransportClosed => write!(f, "transport closed"),
            Self::BufferClosed => write!(f, "outbound buffer closed"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
        }
    }
}

/// The read side of a connection.
pub struct InboundPump<R> {
    id: ConnectionId,
    reader: TransportReader<R>,
    buffer: BufferSender,
    deadline: LivenessDeadline,
}

impl<R: FrameSource> InboundPump<R> {
    /// Build the pump; the liveness deadline starts now.
    pub fn new(
        id: ConnectionId,
        reader: TransportReader<R>,
        buffer: BufferSender,
        policy: &LivenessPolicy,
    ) -> Self {
        Self {
            id,
            reader,
            buffer,
            deadline: LivenessDeadline::start(policy.probe_ack_timeout),
        }
    }

    /// Probe acknowledgment received: push the deadline out by one window.
    pub fn on_probe_ack(&mut self) {
        self.deadline.refresh();
    }

    /// Run until a read fails, then close the transport and the buffer.
    #[instrument(name = "inbound_pump", skip_all, fields(connection_id = %self.id))]
    pub async fn run(mut self) -> InboundExit {
        let exit = self.pump().await;
        match &exit {
            InboundExit::PeerClosed | InboundExit::TransportClosed | InboundExit::BufferClosed => {
                debug!(reason = %exit, "inbound pump stopped");
            }
            InboundExit::ReadFailed(TransportError::Disconnected) => {
                info!(reason = %exit, "inbound pump stopped");
            }
            InboundExit::DeadlineElapsed | InboundExit::ReadFailed(_) => {
                warn!(reason = %exit, "inbound pump stopped");
            }
        }

        let _ = self.reader.close();
        drop(self.buffer);
        exit
    }

    async fn pump(&mut self) -> InboundExit {
        loop {
            let frame = match time::timeout_at(self.deadline.instant(), self.reader.read()).await {
                Err(_) => return InboundExit::DeadlineElapsed,
                Ok(Err(TransportError::Closed)) => return InboundExit::TransportClosed,
                Ok(Err(e)) => return InboundExit::ReadFailed(e),
                Ok(Ok(frame)) => frame,
            };

            match frame {
                Frame::Message(payload) => {
                    let closed = self.reader.close_handle();
                    tokio::select! {
                        biased;
                        () = closed.closed() => return InboundExit::TransportClosed,
                        sent = self.buffer.send(payload) => {
                            if sent.is_err() {
                                return InboundExit::BufferClosed;
                            }
                        }
                    }
                }
                Frame::ProbeAck(_) => self.on_probe_ack(),
                // Answered by the WebSocket layer.
                Frame::Probe(_) => {}
                Frame::Close => return InboundExit::PeerClosed,
            }
        }
    }
}
