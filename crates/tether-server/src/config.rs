//! Server configuration.

use std::net::IpAddr;
use std::time::Duration;

use tether_settings::TetherSettings;

use crate::errors::ServerError;
use crate::websocket::buffer::DEFAULT_BUFFER_DEPTH;
use crate::websocket::liveness::LivenessPolicy;

/// Runtime configuration for the relay, built once at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8080`, `0` picks a free port).
    pub port: u16,
    /// Max `WebSocket` message size in bytes.
    pub max_message_size: usize,
    /// Outbound buffer depth per connection.
    pub buffer_depth: usize,
    /// Ping/pong and write timing.
    pub liveness: LivenessPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            max_message_size: 1024 * 1024, // 1 MB
            buffer_depth: DEFAULT_BUFFER_DEPTH,
            liveness: LivenessPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Convert loaded settings, rejecting timings the pumps cannot run with.
    pub fn from_settings(settings: &TetherSettings) -> Result<Self, ServerError> {
        let liveness = &settings.liveness;
        let policy = LivenessPolicy::new(
            Duration::from_millis(liveness.probe_interval_ms),
            Duration::from_millis(liveness.write_timeout_ms),
        )
        .with_probe_ack_timeout(Duration::from_millis(
            liveness.effective_probe_ack_timeout_ms(),
        ));

        let config = Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            max_message_size: settings.server.max_message_size,
            buffer_depth: settings.server.buffer_depth,
            liveness: policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration as a whole.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig("host must not be empty".into()));
        }
        if self.max_message_size == 0 {
            return Err(ServerError::InvalidConfig(
                "max message size must be non-zero".into(),
            ));
        }
        self.liveness.validate()
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        join_host_port(&self.host, self.port)
    }
}

/// Join a host and port into one address. IPv6 literals are bracketed.
pub fn join_host_port(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{host}]:{port}"),
        _ => format!("{host}:{port}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.buffer_depth, 1);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn from_default_settings_matches_default() {
        let cfg = ServerConfig::from_settings(&TetherSettings::default()).unwrap();
        let default = ServerConfig::default();
        assert_eq!(cfg.host, default.host);
        assert_eq!(cfg.port, default.port);
        assert_eq!(cfg.max_message_size, default.max_message_size);
        assert_eq!(cfg.liveness, default.liveness);
    }

    #[test]
    fn ack_timeout_derived_from_interval() {
        let mut settings = TetherSettings::default();
        settings.liveness.probe_interval_ms = 100;
        let cfg = ServerConfig::from_settings(&settings).unwrap();
        assert_eq!(cfg.liveness.probe_interval, Duration::from_millis(100));
        assert_eq!(cfg.liveness.probe_ack_timeout, Duration::from_millis(120));
    }

    #[test]
    fn explicit_ack_timeout_wins() {
        let mut settings = TetherSettings::default();
        settings.liveness.probe_ack_timeout_ms = Some(7000);
        let cfg = ServerConfig::from_settings(&settings).unwrap();
        assert_eq!(cfg.liveness.probe_ack_timeout, Duration::from_secs(7));
    }

    #[test]
    fn rejects_ack_timeout_below_interval() {
        let mut settings = TetherSettings::default();
        settings.liveness.probe_ack_timeout_ms = Some(1000);
        let err = ServerConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_write_timeout() {
        let mut settings = TetherSettings::default();
        settings.liveness.write_timeout_ms = 0;
        assert!(ServerConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn rejects_empty_host() {
        let cfg = ServerConfig {
            host: "  ".into(),
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn join_ipv4_and_names() {
        assert_eq!(join_host_port("127.0.0.1", 9000), "127.0.0.1:9000");
        assert_eq!(join_host_port("localhost", 80), "localhost:80");
    }

    #[test]
    fn join_ipv6_is_bracketed() {
        assert_eq!(join_host_port("::1", 8080), "[::1]:8080");
        assert_eq!(join_host_port("::", 0), "[::]:0");
    }
}
