//! Voice relay — entry point.
//!
//! This binary accepts TCP connections from voice clients and relays their
//! session-tagged traffic to the single persistent connection of the
//! voice-to-action service.  Short-lived client sockets on one side, one
//! long-lived upstream socket on the other, with a bounded queue in between.
//!
//! # Usage
//!
//! ```text
//! voice-relay [OPTIONS]
//!
//! Options:
//!   --listen-port <PORT>        Client listener port [default: 8087]
//!   --listen-bind <ADDR>        Client listener bind address [default: 0.0.0.0]
//!   --upstream-host <HOST>      Voice-to-action service host [default: 127.0.0.1]
//!   --upstream-port <PORT>      Voice-to-action service port [default: 8011]
//!   --queue-capacity <N>        Relay queue bound [default: 100]
//!   --overflow <POLICY>         Full-queue behavior: block | drop-newest [default: block]
//!   --reconnect-delay-ms <MS>   Delay between upstream redials [default: 1000]
//!   --client-timeout-secs <S>   Per-read client timeout [default: 60]
//! ```
//!
//! # Environment variable overrides
//!
//! Each flag can also be set via environment variable (`VOICE_RELAY_PORT`,
//! `VOICE_RELAY_BIND`, `VOICE_RELAY_UPSTREAM_HOST`, ...).  CLI arguments
//! take precedence when both are present.
//!
//! # Architecture overview
//!
//! ```text
//! Voice clients (plain text over TCP)
//!       ↕
//! voice-relay  ← this process
//!   acceptor      one task per client connection
//!   client tasks  classify chunks, publish RelayMessages, write direct reply
//!   relay queue   bounded mpsc, handlers → dispatcher
//!   dispatcher    one task, owns the upstream connection, redials forever
//!       ↕
//! voice-to-action service (TCP, primed with session + capability lines)
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use voice_relay_server::application::content::CannedCatalog;
use voice_relay_server::domain::config::{OverflowPolicy, RelayConfig};
use voice_relay_server::infrastructure::{RelayQueue, RelayServer, UpstreamDispatcher};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// CLI mirror of [`OverflowPolicy`]; kept separate so the domain type stays
/// free of clap derives.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OverflowArg {
    /// Producers wait for a free slot (backpressure).
    Block,
    /// The newest message is discarded and the drop logged.
    DropNewest,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Block => OverflowPolicy::Block,
            OverflowArg::DropNewest => OverflowPolicy::DropNewest,
        }
    }
}

/// Voice relay.
///
/// Accepts TCP connections from voice clients and relays session-tagged
/// traffic to the voice-to-action service over one persistent connection.
#[derive(Debug, Parser)]
#[command(
    name = "voice-relay",
    about = "Session-multiplexing TCP relay for voice clients",
    version
)]
struct Cli {
    /// TCP port for the client listener.
    #[arg(long, default_value_t = 8087, env = "VOICE_RELAY_PORT")]
    listen_port: u16,

    /// IP address to bind the client listener to.
    ///
    /// Use `0.0.0.0` to accept connections from any interface, or
    /// `127.0.0.1` for local-only deployments.
    #[arg(long, default_value = "0.0.0.0", env = "VOICE_RELAY_BIND")]
    listen_bind: String,

    /// Hostname or IP address of the voice-to-action service.
    #[arg(long, default_value = "127.0.0.1", env = "VOICE_RELAY_UPSTREAM_HOST")]
    upstream_host: String,

    /// TCP port of the voice-to-action service.
    #[arg(long, default_value_t = 8011, env = "VOICE_RELAY_UPSTREAM_PORT")]
    upstream_port: u16,

    /// Bound of the relay queue, in messages.
    #[arg(long, default_value_t = 100, env = "VOICE_RELAY_QUEUE_CAPACITY")]
    queue_capacity: usize,

    /// What client handlers do when the relay queue is full.
    #[arg(long, value_enum, default_value_t = OverflowArg::Block, env = "VOICE_RELAY_OVERFLOW")]
    overflow: OverflowArg,

    /// Fixed delay between upstream redial attempts, in milliseconds.
    #[arg(long, default_value_t = 1000, env = "VOICE_RELAY_RECONNECT_DELAY_MS")]
    reconnect_delay_ms: u64,

    /// Per-read timeout on client connections, in seconds.  A client silent
    /// for longer than this is abandoned.
    #[arg(long, default_value_t = 60, env = "VOICE_RELAY_CLIENT_TIMEOUT_SECS")]
    client_timeout_secs: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// The upstream host may be a hostname; it is resolved here, once, at
    /// startup.  The listen bind must be a literal IP address.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address does not parse, the upstream
    /// host does not resolve to any address, or the queue capacity is zero.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let listen_addr: SocketAddr = format!("{}:{}", self.listen_bind, self.listen_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid listen address: '{}:{}'",
                    self.listen_bind, self.listen_port
                )
            })?;

        let upstream_addr: SocketAddr = (self.upstream_host.as_str(), self.upstream_port)
            .to_socket_addrs()
            .with_context(|| {
                format!(
                    "failed to resolve upstream address: '{}:{}'",
                    self.upstream_host, self.upstream_port
                )
            })?
            .next()
            .with_context(|| {
                format!(
                    "upstream host '{}' resolved to no addresses",
                    self.upstream_host
                )
            })?;

        anyhow::ensure!(
            self.queue_capacity >= 1,
            "--queue-capacity must be at least 1"
        );

        Ok(RelayConfig {
            listen_addr,
            upstream_addr,
            queue_capacity: self.queue_capacity,
            overflow: self.overflow.into(),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            client_read_timeout: Duration::from_secs(self.client_timeout_secs),
            read_buffer_size: RelayConfig::default().read_buffer_size,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG; fall back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(cli.into_relay_config()?);

    info!(
        "voice relay starting — listen={}, upstream={}",
        config.listen_addr, config.upstream_addr
    );

    // One shutdown signal for the whole process: Ctrl+C clears the flag, the
    // acceptor stops, the queue closes as producers drop, and the dispatcher
    // drains and exits.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    let content = Arc::new(CannedCatalog);

    // The relay queue: created once here, closed once when the acceptor and
    // the last client handler drop their producer handles.
    let (queue, queue_rx) = RelayQueue::new(config.queue_capacity, config.overflow);

    let dispatcher = UpstreamDispatcher::new(Arc::clone(&config), queue_rx, content.clone());
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    let server = RelayServer::bind(Arc::clone(&config), queue, content).await?;
    server.serve(running).await;

    // The acceptor has dropped its queue handle; wait for the dispatcher to
    // drain whatever the remaining client handlers still publish.
    dispatcher_handle
        .await
        .context("upstream dispatcher task panicked")?;

    info!("voice relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_original_deployment() {
        let cli = Cli::parse_from(["voice-relay"]);
        assert_eq!(cli.listen_port, 8087);
        assert_eq!(cli.upstream_host, "127.0.0.1");
        assert_eq!(cli.upstream_port, 8011);
        assert_eq!(cli.queue_capacity, 100);
        assert_eq!(cli.reconnect_delay_ms, 1000);
        assert_eq!(cli.client_timeout_secs, 60);
    }

    #[test]
    fn test_cli_overrides_are_applied() {
        let cli = Cli::parse_from([
            "voice-relay",
            "--listen-port",
            "9000",
            "--upstream-host",
            "10.0.0.5",
            "--upstream-port",
            "9011",
            "--overflow",
            "drop-newest",
        ]);
        assert_eq!(cli.listen_port, 9000);
        assert_eq!(cli.upstream_host, "10.0.0.5");
        assert_eq!(cli.upstream_port, 9011);
        assert!(matches!(cli.overflow, OverflowArg::DropNewest));
    }

    #[test]
    fn test_into_relay_config_builds_addresses() {
        let cli = Cli::parse_from(["voice-relay", "--listen-bind", "127.0.0.1"]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8087");
        assert_eq!(config.upstream_addr.to_string(), "127.0.0.1:8011");
        assert_eq!(config.overflow, OverflowPolicy::Block);
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_into_relay_config_resolves_hostname_upstream() {
        // The upstream flag accepts hostnames, not just IP literals.
        let cli = Cli::parse_from(["voice-relay", "--upstream-host", "localhost"]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.upstream_addr.port(), 8011);
        assert!(config.upstream_addr.ip().is_loopback());
    }

    #[test]
    fn test_into_relay_config_rejects_bad_bind_address() {
        let cli = Cli::parse_from(["voice-relay", "--listen-bind", "not.an.ip"]);
        assert!(cli.into_relay_config().is_err());
    }

    #[test]
    fn test_into_relay_config_rejects_zero_capacity() {
        let cli = Cli::parse_from(["voice-relay", "--queue-capacity", "0"]);
        assert!(cli.into_relay_config().is_err());
    }
}
