//! Frame-level transport shared by the two pumps of a connection.
//!
//! A transport is split into a read half ([`TransportReader`]), owned by the
//! inbound pump, and a write half ([`TransportWriter`]), owned by the outbound
//! pump. Both halves share one [`CloseHandle`]. Closing it is idempotent and
//! makes every pending or later read/write on either half fail with
//! [`TransportError::Closed`].

pub mod axum_ws;
pub mod memory;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// An application payload. The kind is kept so an echo goes out the way it
/// came in; the bytes are never inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Bytes),
}

impl Payload {
    /// Text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Binary payload.
    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A frame as seen by the pumps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// Application data.
    Message(Payload),
    /// Liveness probe (WebSocket ping).
    Probe(Bytes),
    /// Probe acknowledgment (WebSocket pong).
    ProbeAck(Bytes),
    /// Close request.
    Close,
}

/// Errors raised by transport reads and writes.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport was closed locally by one of the pumps.
    #[error("transport closed")]
    Closed,
    /// The peer went away without a close handshake.
    #[error("peer disconnected")]
    Disconnected,
    /// Protocol or I/O failure reported by the WebSocket layer.
    #[error("websocket error: {0}")]
    WebSocket(#[from] axum::Error),
}

/// Read half of a concrete transport.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Wait for the next frame. End of stream is [`TransportError::Disconnected`].
    async fn next_frame(&mut self) -> Result<Frame, TransportError>;
}

/// Write half of a concrete transport.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Write one frame.
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Send a close frame to the peer, best effort.
    async fn send_close(&mut self) -> Result<(), TransportError>;
}

/// The transport's closed-state, shared by both halves.
#[derive(Clone, Debug, Default)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
    token: CancellationToken,
}

impl CloseHandle {
    /// A fresh, open handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the transport.
    ///
    /// Safe to call any number of times from either half. Returns `true`
    /// only for the call that actually closed it.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the transport has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once the transport is closed.
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }
}

/// Read half handed to the inbound pump.
pub struct TransportReader<R> {
    source: R,
    close: CloseHandle,
}

impl<R: FrameSource> TransportReader<R> {
    /// Read the next frame, failing immediately once the transport is closed.
    pub async fn read(&mut self) -> Result<Frame, TransportError> {
        if self.close.is_closed() {
            return Err(TransportError::Closed);
        }
        tokio::select! {
            biased;
            () = self.close.closed() => Err(TransportError::Closed),
            frame = self.source.next_frame() => frame,
        }
    }

    /// Close the shared transport. See [`CloseHandle::close`].
    pub fn close(&self) -> bool {
        self.close.close()
    }

    /// The shared close handle.
    pub fn close_handle(&self) -> &CloseHandle {
        &self.close
    }
}

/// Write half handed to the outbound pump.
pub struct TransportWriter<W> {
    sink: W,
    close: CloseHandle,
}

impl<W: FrameSink> TransportWriter<W> {
    /// Write one frame, failing immediately once the transport is closed.
    pub async fn write(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.close.is_closed() {
            return Err(TransportError::Closed);
        }
        tokio::select! {
            biased;
            () = self.close.closed() => Err(TransportError::Closed),
            result = self.sink.send_frame(frame) => result,
        }
    }

    /// Close the shared transport. See [`CloseHandle::close`].
    pub fn close(&self) -> bool {
        self.close.close()
    }

    /// Tell the peer we are going away. Called once, after [`close`](Self::close).
    pub async fn send_close(&mut self) -> Result<(), TransportError> {
        self.sink.send_close().await
    }

    /// The shared close handle.
    pub fn close_handle(&self) -> &CloseHandle {
        &self.close
    }
}

/// An established transport, not yet split between the pumps.
pub struct Transport<R, W> {
    reader: TransportReader<R>,
    writer: TransportWriter<W>,
}

impl<R: FrameSource, W: FrameSink> Transport<R, W> {
    /// Join a read half and a write half under one close handle.
    pub fn new(source: R, sink: W) -> Self {
        let close = CloseHandle::new();
        Self {
            reader: TransportReader {
                source,
                close: close.clone(),
            },
            writer: TransportWriter { sink, close },
        }
    }

    /// The shared close handle.
    pub fn close_handle(&self) -> CloseHandle {
        self.reader.close.clone()
    }

    /// Hand out the two halves.
    pub fn into_parts(self) -> (TransportReader<R>, TransportWriter<W>) {
        (self.reader, self.writer)
    }
}
