//! In-process transport.
//!
//! Frames from the peer arrive on an unbounded channel; frames to the peer go
//! through a bounded one, so a peer that stops reading makes writes block the
//! same way a stalled socket does.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::{Frame, FrameSink, FrameSource, Payload, Transport, TransportError};

/// Read half of an in-memory transport.
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<Frame>,
}

/// Write half of an in-memory transport.
pub struct MemorySink {
    tx: mpsc::Sender<Frame>,
}

/// The remote end of an in-memory transport.
pub struct MemoryPeer {
    tx: mpsc::UnboundedSender<Frame>,
    rx: mpsc::Receiver<Frame>,
}

/// Create a transport and its peer. `capacity` bounds frames written to the
/// peer that it has not yet received (minimum 1).
pub fn pair(capacity: usize) -> (Transport<MemorySource, MemorySink>, MemoryPeer) {
    let (to_server, from_peer) = mpsc::unbounded_channel();
    let (to_peer, from_server) = mpsc::channel(capacity.max(1));
    let transport = Transport::new(MemorySource { rx: from_peer }, MemorySink { tx: to_peer });
    let peer = MemoryPeer {
        tx: to_server,
        rx: from_server,
    };
    (transport, peer)
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Disconnected)
    }
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| TransportError::Disconnected)
    }

    async fn send_close(&mut self) -> Result<(), TransportError> {
        self.send_frame(Frame::Close).await
    }
}

impl MemoryPeer {
    /// Send a frame to the server side. `false` once the server stopped reading.
    pub fn send(&self, frame: Frame) -> bool {
        self.tx.send(frame).is_ok()
    }

    /// Send a text message.
    pub fn send_text(&self, text: &str) -> bool {
        self.send(Frame::Message(Payload::text(text)))
    }

    /// Acknowledge a probe.
    pub fn ack(&self) -> bool {
        self.send(Frame::ProbeAck(Bytes::new()))
    }

    /// Next frame written by the server; `None` once the write half is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Next application payload, skipping probes.
    pub async fn recv_message(&mut self) -> Option<Payload> {
        loop {
            match self.rx.recv().await? {
                Frame::Message(payload) => return Some(payload),
                Frame::Close => return None,
                Frame::Probe(_) | Frame::ProbeAck(_) => {}
            }
        }
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}
