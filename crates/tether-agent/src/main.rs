//! # tether
//!
//! Relay binary: resolves settings, installs logging, and serves `/ws` until
//! Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tether_server::config::ServerConfig;
use tether_server::server::TetherServer;
use tether_settings::{LogFormat, TetherSettings};

/// `WebSocket` echo relay with ping/pong liveness.
#[derive(Parser, Debug)]
#[command(name = "tether", about = "WebSocket echo relay with ping/pong liveness")]
struct Cli {
    /// Host to bind.
    #[arg(long)]
    addr: Option<String>,

    /// Port to bind, as `8080` or `:8080` (0 for auto-assign).
    #[arg(long, value_parser = parse_port)]
    port: Option<u16>,

    /// Settings file (defaults to `~/.tether/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Interval between pings, in milliseconds.
    #[arg(long)]
    probe_interval_ms: Option<u64>,

    /// How long to wait for a pong, in milliseconds (default 1.2x the probe interval).
    #[arg(long)]
    probe_ack_timeout_ms: Option<u64>,

    /// Bound on each outbound write, in milliseconds.
    #[arg(long)]
    write_timeout_ms: Option<u64>,

    /// Outbound buffer depth per connection.
    #[arg(long)]
    buffer_depth: Option<usize>,

    /// Log filter directive, e.g. `debug` or `info,tether_server=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Seconds to wait for the listener to drain on shutdown.
    #[arg(long, default_value = "10")]
    shutdown_timeout_secs: u64,
}

impl Cli {
    /// Apply flags over loaded settings. Flags win over file and env.
    fn apply(&self, settings: &mut TetherSettings) {
        if let Some(addr) = &self.addr {
            settings.server.host.clone_from(addr);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(ms) = self.probe_interval_ms {
            settings.liveness.probe_interval_ms = ms;
        }
        if let Some(ms) = self.probe_ack_timeout_ms {
            settings.liveness.probe_ack_timeout_ms = Some(ms);
        }
        if let Some(ms) = self.write_timeout_ms {
            settings.liveness.write_timeout_ms = ms;
        }
        if let Some(depth) = self.buffer_depth {
            settings.server.buffer_depth = depth;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.json_logs {
            settings.logging.format = LogFormat::Json;
        }
    }

    fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(tether_settings::settings_path)
    }
}

/// Accept `8080` as well as the `:8080` listen-address form.
fn parse_port(raw: &str) -> Result<u16, String> {
    let digits = raw.strip_prefix(':').unwrap_or(raw);
    digits
        .parse::<u16>()
        .map_err(|e| format!("invalid port {raw:?}: {e}"))
}

fn resolve_config(cli: &Cli) -> Result<(TetherSettings, ServerConfig)> {
    let path = cli.settings_path();
    let mut settings = tether_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    cli.apply(&mut settings);
    let config = ServerConfig::from_settings(&settings).context("Invalid server configuration")?;
    Ok((settings, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (settings, config) = resolve_config(&cli)?;

    tether_logging::init_logging(&settings.logging).context("Failed to initialize logging")?;

    let server = TetherServer::new(config);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;

    let liveness = server.config().liveness;
    tracing::info!(
        probe_interval_ms = u64::try_from(liveness.probe_interval.as_millis()).unwrap_or(u64::MAX),
        probe_ack_timeout_ms =
            u64::try_from(liveness.probe_ack_timeout.as_millis()).unwrap_or(u64::MAX),
        write_timeout_ms = u64::try_from(liveness.write_timeout.as_millis()).unwrap_or(u64::MAX),
        "tether listening on ws://{addr}/ws"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let drained = server
        .shutdown()
        .graceful_shutdown(
            vec![handle],
            Some(Duration::from_secs(cli.shutdown_timeout_secs)),
        )
        .await;
    if drained {
        tracing::info!("Shutdown complete");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_leave_settings_alone() {
        let cli = Cli::parse_from(["tether"]);
        let mut settings = TetherSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, TetherSettings::default());
        assert_eq!(cli.shutdown_timeout_secs, 10);
    }

    #[test]
    fn port_accepts_colon_form() {
        let cli = Cli::parse_from(["tether", "--port", ":9000"]);
        assert_eq!(cli.port, Some(9000));
        let cli = Cli::parse_from(["tether", "--port", "9001"]);
        assert_eq!(cli.port, Some(9001));
    }

    #[test]
    fn port_rejects_garbage() {
        assert!(Cli::try_parse_from(["tether", "--port", "eighty"]).is_err());
        assert!(Cli::try_parse_from(["tether", "--port", ":70000"]).is_err());
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "tether",
            "--addr",
            "127.0.0.1",
            "--port",
            ":0",
            "--probe-interval-ms",
            "1000",
            "--probe-ack-timeout-ms",
            "1500",
            "--write-timeout-ms",
            "250",
            "--buffer-depth",
            "4",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        let mut settings = TetherSettings::default();
        cli.apply(&mut settings);

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 0);
        assert_eq!(settings.server.buffer_depth, 4);
        assert_eq!(settings.liveness.probe_interval_ms, 1000);
        assert_eq!(settings.liveness.probe_ack_timeout_ms, Some(1500));
        assert_eq!(settings.liveness.write_timeout_ms, 250);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn resolve_reads_settings_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 9100, "bufferDepth": 2}, "liveness": {"probeIntervalMs": 2000}}"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "tether",
            "--settings",
            path.to_str().unwrap(),
            "--port",
            "9200",
        ]);
        let (settings, config) = resolve_config(&cli).unwrap();
        assert_eq!(settings.server.buffer_depth, 2);
        assert_eq!(config.port, 9200);
        assert_eq!(config.liveness.probe_interval, Duration::from_secs(2));
        assert_eq!(config.liveness.probe_ack_timeout, Duration::from_millis(2400));
    }

    #[test]
    fn resolve_rejects_bad_timings() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "tether",
            "--settings",
            dir.path().join("missing.json").to_str().unwrap(),
            "--probe-interval-ms",
            "1000",
            "--probe-ack-timeout-ms",
            "500",
        ]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("must exceed probe interval"));
    }

    #[tokio::test]
    async fn server_boots_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "tether",
            "--settings",
            dir.path().join("settings.json").to_str().unwrap(),
            "--addr",
            "127.0.0.1",
            "--port",
            "0",
        ]);
        let (_settings, config) = resolve_config(&cli).unwrap();
        let server = TetherServer::new(config);
        let (addr, handle) = server.listen().await.unwrap();
        assert!(addr.ip().is_loopback());

        let drained = server
            .shutdown()
            .graceful_shutdown(vec![handle], Some(Duration::from_secs(5)))
            .await;
        assert!(drained);
    }
}
