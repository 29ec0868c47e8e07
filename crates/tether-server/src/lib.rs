//! # tether-server
//!
//! Axum HTTP + `WebSocket` relay.
//!
//! - `/ws`: upgrades the request and hands the socket to a [`Connection`]
//! - Each connection runs an inbound pump and an outbound pump as two tokio
//!   tasks, coupled only by the outbound buffer and the transport's
//!   closed-state
//! - Liveness: periodic pings, a read deadline renewed on every pong, and a
//!   bound on every write
//! - `/health`: uptime and open-connection count
//!
//! [`Connection`]: websocket::connection::Connection

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod transport;
pub mod websocket;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use server::TetherServer;
