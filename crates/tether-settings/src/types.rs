//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may be partial: missing fields keep their compiled default.

use serde::{Deserialize, Serialize};

/// Root settings type for the relay.
///
/// ```json
/// {
///   "server": { "host": "0.0.0.0", "port": 8080 },
///   "liveness": { "probeIntervalMs": 5000 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TetherSettings {
    /// Listener and per-connection buffer settings.
    pub server: ServerSettings,
    /// Probe/ack/write timing.
    pub liveness: LivenessSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,
    /// Capacity of the per-connection outbound buffer.
    ///
    /// `0` requests a synchronous handoff and is treated as a single slot.
    pub buffer_depth: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_message_size: 1024 * 1024,
            buffer_depth: 1,
        }
    }
}

/// Liveness timing, all in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivenessSettings {
    /// How often a probe (ping) is written to each peer.
    pub probe_interval_ms: u64,
    /// How long to wait for a probe acknowledgment (pong).
    ///
    /// `None` derives it as 1.2x `probe_interval_ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_ack_timeout_ms: Option<u64>,
    /// Upper bound on any single outbound write.
    pub write_timeout_ms: u64,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            probe_interval_ms: 5_000,
            probe_ack_timeout_ms: None,
            write_timeout_ms: 5_000,
        }
    }
}

impl LivenessSettings {
    /// Effective ack timeout in milliseconds (explicit value or 1.2x interval).
    pub fn effective_probe_ack_timeout_ms(&self) -> u64 {
        self.probe_ack_timeout_ms
            .unwrap_or(self.probe_interval_ms.saturating_mul(12) / 10)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_settings() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8080);
        assert_eq!(s.buffer_depth, 1);
    }

    #[test]
    fn default_liveness_derives_ack_timeout() {
        let l = LivenessSettings::default();
        assert_eq!(l.probe_interval_ms, 5_000);
        assert_eq!(l.effective_probe_ack_timeout_ms(), 6_000);
        assert_eq!(l.write_timeout_ms, 5_000);
    }

    #[test]
    fn explicit_ack_timeout_wins() {
        let l = LivenessSettings {
            probe_ack_timeout_ms: Some(9_000),
            ..LivenessSettings::default()
        };
        assert_eq!(l.effective_probe_ack_timeout_ms(), 9_000);
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(TetherSettings::default()).unwrap();
        assert_eq!(json["server"]["maxMessageSize"], 1024 * 1024);
        assert_eq!(json["server"]["bufferDepth"], 1);
        assert_eq!(json["liveness"]["probeIntervalMs"], 5_000);
        assert!(json["liveness"].get("probeAckTimeoutMs").is_none());
        assert_eq!(json["logging"]["format"], "pretty");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: TetherSettings =
            serde_json::from_str(r#"{"liveness": {"writeTimeoutMs": 250}}"#).unwrap();
        assert_eq!(s.liveness.write_timeout_ms, 250);
        assert_eq!(s.liveness.probe_interval_ms, 5_000);
        assert_eq!(s.server, ServerSettings::default());
    }

    #[test]
    fn log_format_lowercase() {
        let f: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(f, LogFormat::Json);
    }
}
