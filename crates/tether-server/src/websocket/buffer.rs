//! Outbound buffer: the single-producer, single-consumer handoff between the
//! inbound pump and the outbound pump of one connection.
//!
//! Dropping the sender closes the buffer. The receiver still drains what was
//! queued, then sees `None`, which the outbound pump treats as termination.

use tokio::sync::mpsc;

use crate::transport::Payload;

/// Default buffer depth: one in-flight message.
pub const DEFAULT_BUFFER_DEPTH: usize = 1;

/// Producer side, owned by the inbound pump.
pub type BufferSender = mpsc::Sender<Payload>;

/// Consumer side, owned by the outbound pump.
pub type BufferReceiver = mpsc::Receiver<Payload>;

/// Channel capacity for a configured depth. A depth of `0` (synchronous
/// handoff) maps to a single slot, the smallest bounded channel tokio offers.
pub fn effective_depth(depth: usize) -> usize {
    depth.max(1)
}

/// Create a buffer of the given depth.
pub fn outbound_buffer(depth: usize) -> (BufferSender, BufferReceiver) {
    mpsc::channel(effective_depth(depth))
}
