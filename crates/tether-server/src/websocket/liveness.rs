//! Ping/pong liveness timing.
//!
//! Three durations make up the contract:
//! - `probe_interval`: how often the outbound pump pings the peer
//! - `probe_ack_timeout`: how long the inbound pump waits for a pong, both
//!   initially and after each pong it receives
//! - `write_timeout`: bound on any single outbound write
//!
//! Only pongs move the deadline. A peer that keeps sending data but never
//! answers pings is still dropped once the deadline passes.

use std::time::Duration;

use tokio::time::Instant;

use crate::errors::ServerError;

/// Default ping period.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Default bound on a single write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Derive the ack timeout from the probe interval: 1.2x, so a peer gets
/// slightly more than one full interval to answer.
pub fn derive_probe_ack_timeout(probe_interval: Duration) -> Duration {
    probe_interval * 12 / 10
}

/// Liveness timing for one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LivenessPolicy {
    /// Ping period.
    pub probe_interval: Duration,
    /// Initial read deadline and refresh window after each pong.
    pub probe_ack_timeout: Duration,
    /// Bound on each outbound write.
    pub write_timeout: Duration,
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_INTERVAL, DEFAULT_WRITE_TIMEOUT)
    }
}

impl LivenessPolicy {
    /// Policy with the ack timeout derived from `probe_interval`.
    pub fn new(probe_interval: Duration, write_timeout: Duration) -> Self {
        Self {
            probe_interval,
            probe_ack_timeout: derive_probe_ack_timeout(probe_interval),
            write_timeout,
        }
    }

    /// Override the derived ack timeout.
    #[must_use]
    pub fn with_probe_ack_timeout(mut self, probe_ack_timeout: Duration) -> Self {
        self.probe_ack_timeout = probe_ack_timeout;
        self
    }

    /// Reject timings the pumps cannot run with.
    ///
    /// All durations must be non-zero, and the ack timeout must exceed the
    /// probe interval so a healthy peer is always pinged before its deadline.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.probe_interval.is_zero() {
            return Err(ServerError::InvalidConfig(
                "probe interval must be non-zero".into(),
            ));
        }
        if self.write_timeout.is_zero() {
            return Err(ServerError::InvalidConfig(
                "write timeout must be non-zero".into(),
            ));
        }
        if self.probe_ack_timeout <= self.probe_interval {
            return Err(ServerError::InvalidConfig(format!(
                "probe ack timeout ({:?}) must exceed probe interval ({:?})",
                self.probe_ack_timeout, self.probe_interval
            )));
        }
        Ok(())
    }
}

/// The instant by which the next pong must arrive.
///
/// Owned by the inbound pump and only touched from its read loop.
#[derive(Clone, Copy, Debug)]
pub struct LivenessDeadline {
    at: Instant,
    window: Duration,
}

impl LivenessDeadline {
    /// Deadline `window` from now.
    pub fn start(window: Duration) -> Self {
        Self {
            at: Instant::now() + window,
            window,
        }
    }

    /// Push the deadline to `window` from now.
    pub fn refresh(&mut self) {
        self.at = Instant::now() + self.window;
    }

    /// The current deadline.
    pub fn instant(&self) -> Instant {
        self.at
    }
}
