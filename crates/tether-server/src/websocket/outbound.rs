//! Outbound pump: writes buffered messages and periodic probes to the peer.
//!
//! Two event sources are multiplexed with `tokio::select!`, whose random
//! branch order keeps either source from starving the other. Each write is
//! bounded by the write timeout. Buffer closure ends the pump; it is never
//! mistaken for an empty message.

use std::fmt;

use bytes::Bytes;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, instrument, warn};

use super::buffer::BufferReceiver;
use super::connection::ConnectionId;
use super::liveness::LivenessPolicy;
use crate::transport::{Frame, FrameSink, Payload, TransportError, TransportWriter};

/// Why the outbound pump stopped.
#[derive(Debug)]
pub enum OutboundExit {
    /// The inbound pump closed the buffer and everything queued was handled.
    BufferClosed,
    /// Writing a message failed.
    WriteFailed(TransportError),
    /// Writing a message did not finish within the write timeout.
    WriteTimedOut,
    /// Writing a probe failed.
    ProbeFailed(TransportError),
    /// Writing a probe did not finish within the write timeout.
    ProbeTimedOut,
}

impl fmt::Display for OutboundExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferClosed => write!(f, "outbound buffer closed"),
            Self::WriteFailed(e) => write!(f, "message write failed: {e}"),
            Self::WriteTimedOut => write!(f, "message write timed out"),
            Self::ProbeFailed(e) => write!(f, "probe write failed: {e}"),
            Self::ProbeTimedOut => write!(f, "probe write timed out"),
        }
    }
}

enum Event {
    Message(Option<Payload>),
    ProbeDue,
}

enum WriteOutcome {
    Written,
    Failed(TransportError),
    TimedOut,
}

/// The write side of a connection.
pub struct OutboundPump<W> {
    id: ConnectionId,
    writer: TransportWriter<W>,
    buffer: BufferReceiver,
    policy: LivenessPolicy,
}

impl<W: FrameSink> OutboundPump<W> {
    /// Build the pump. The first probe goes out one interval after [`run`](Self::run) starts.
    pub fn new(
        id: ConnectionId,
        writer: TransportWriter<W>,
        buffer: BufferReceiver,
        policy: LivenessPolicy,
    ) -> Self {
        Self {
            id,
            writer,
            buffer,
            policy,
        }
    }

    /// Run until the buffer closes or a write fails, then close the transport.
    #[instrument(name = "outbound_pump", skip_all, fields(connection_id = %self.id))]
    pub async fn run(mut self) -> OutboundExit {
        let exit = self.pump().await;
        match &exit {
            OutboundExit::WriteFailed(_) | OutboundExit::WriteTimedOut => {
                warn!(reason = %exit, "outbound pump stopped");
            }
            OutboundExit::BufferClosed
            | OutboundExit::ProbeFailed(_)
            | OutboundExit::ProbeTimedOut => {
                debug!(reason = %exit, "outbound pump stopped");
            }
        }

        if self.writer.close() {
            // We closed first, so the peer has not been told yet.
            match time::timeout(self.policy.write_timeout, self.writer.send_close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "close frame not delivered"),
                Err(_) => debug!("close frame timed out"),
            }
        }
        exit
    }

    async fn pump(&mut self) -> OutboundExit {
        let period = self.policy.probe_interval;
        let mut probes = time::interval_at(Instant::now() + period, period);
        probes.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                message = self.buffer.recv() => Event::Message(message),
                _ = probes.tick() => Event::ProbeDue,
            };

            match event {
                Event::Message(None) => return OutboundExit::BufferClosed,
                Event::Message(Some(payload)) => match self.write(Frame::Message(payload)).await {
                    WriteOutcome::Written => {}
                    WriteOutcome::Failed(e) => return OutboundExit::WriteFailed(e),
                    WriteOutcome::TimedOut => return OutboundExit::WriteTimedOut,
                },
                Event::ProbeDue => match self.write(Frame::Probe(Bytes::new())).await {
                    WriteOutcome::Written => {}
                    WriteOutcome::Failed(e) => return OutboundExit::ProbeFailed(e),
                    WriteOutcome::TimedOut => return OutboundExit::ProbeTimedOut,
                },
            }
        }
    }

    async fn write(&mut self, frame: Frame) -> WriteOutcome {
        match time::timeout(self.policy.write_timeout, self.writer.write(frame)).await {
            Ok(Ok(())) => WriteOutcome::Written,
            Ok(Err(e)) => WriteOutcome::Failed(e),
            Err(_) => WriteOutcome::TimedOut,
        }
    }
}
