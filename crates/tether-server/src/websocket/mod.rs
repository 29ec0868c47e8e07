//! WebSocket connection lifecycle: liveness timing, the outbound buffer, the
//! two pumps, and the upgrade handler that wires them together.

pub mod buffer;
pub mod connection;
pub mod handler;
pub mod inbound;
pub mod liveness;
pub mod outbound;
