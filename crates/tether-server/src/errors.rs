//! Server error types.

use thiserror::Error;

/// Errors surfaced by server setup and connection supervision.
///
/// Nothing here is produced by the pumps themselves: a pump reports why it
/// stopped through its exit type, never through an error.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Any other listener I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration rejected before the server started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A pump task panicked or was aborted.
    #[error("{pump} pump did not finish cleanly: {message}")]
    PumpAborted {
        /// `"inbound"` or `"outbound"`.
        pump: &'static str,
        /// Join error description.
        message: String,
    },
}
