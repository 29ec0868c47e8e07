//! Transport over an upgraded axum `WebSocket`.
//!
//! Pings are answered by the WebSocket layer itself; the pumps only see them
//! as [`Frame::Probe`] and ignore them.

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

use super::{Frame, FrameSink, FrameSource, Payload, Transport, TransportError};

/// Read half of an axum socket.
pub struct WsSource {
    stream: SplitStream<WebSocket>,
}

/// Write half of an axum socket.
pub struct WsSink {
    sink: SplitSink<WebSocket, Message>,
}

/// Split an upgraded socket into a [`Transport`].
pub fn transport(socket: WebSocket) -> Transport<WsSource, WsSink> {
    let (sink, stream) = socket.split();
    Transport::new(WsSource { stream }, WsSink { sink })
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        match self.stream.next().await {
            Some(Ok(message)) => Ok(frame_from_message(message)),
            Some(Err(e)) => Err(TransportError::WebSocket(e)),
            None => Err(TransportError::Disconnected),
        }
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.sink.send(message_from_frame(frame)).await?;
        Ok(())
    }

    async fn send_close(&mut self) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: close_code::NORMAL,
            reason: "".into(),
        };
        self.sink.send(Message::Close(Some(frame))).await?;
        Ok(())
    }
}

/// Map an axum message to a pump frame.
pub fn frame_from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Message(Payload::Text(text.to_string())),
        Message::Binary(bytes) => Frame::Message(Payload::Binary(bytes)),
        Message::Ping(data) => Frame::Probe(data),
        Message::Pong(data) => Frame::ProbeAck(data),
        Message::Close(_) => Frame::Close,
    }
}

/// Map a pump frame to an axum message.
pub fn message_from_frame(frame: Frame) -> Message {
    match frame {
        Frame::Message(Payload::Text(text)) => Message::Text(text.into()),
        Frame::Message(Payload::Binary(bytes)) => Message::Binary(bytes),
        Frame::Probe(data) => Message::Ping(data),
        Frame::ProbeAck(data) => Message::Pong(data),
        Frame::Close => Message::Close(None),
    }
}
