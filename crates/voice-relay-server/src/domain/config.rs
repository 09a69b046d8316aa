//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is constructed once at startup (from CLI arguments in production,
//! from `Default` in tests) and shared behind an `Arc` by every task.
//!
//! No component reads environment variables or global state directly; the
//! CLI layer in `main.rs` is the only place configuration enters the system.

use std::net::SocketAddr;
use std::time::Duration;

/// What a producer does when the relay queue is full.
///
/// The queue bound exists for memory safety, not flow control; which side
/// pays for a full queue is an explicit deployment decision rather than a
/// silent drop buried in the send path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// The publishing client handler waits until the dispatcher has drained
    /// a slot.  Backpressure stalls only the offending client's read loop.
    Block,
    /// The newest message is discarded (and the drop logged).  Keeps every
    /// client responsive at the cost of losing relay traffic.
    DropNewest,
}

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use voice_relay_server::domain::RelayConfig;
///
/// // Defaults are suitable for local development:
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.listen_addr.port(), 8087);
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the client-facing TCP listener binds to.
    pub listen_addr: SocketAddr,

    /// Address of the upstream voice-to-action service.
    pub upstream_addr: SocketAddr,

    /// Bound of the relay queue (messages, not bytes).  Must be at least 1.
    pub queue_capacity: usize,

    /// What producers do when the queue is full.
    pub overflow: OverflowPolicy,

    /// Fixed delay between upstream redial attempts.  No jitter, no cap,
    /// unbounded retries — this is the system's only retry policy.
    pub reconnect_delay: Duration,

    /// Per-read timeout on client connections.  A client that stays silent
    /// longer than this is considered stalled and abandoned.
    pub client_read_timeout: Duration,

    /// Size of the per-connection read buffer.  One read of up to this many
    /// bytes is one classified chunk.
    pub read_buffer_size: usize,
}

impl Default for RelayConfig {
    /// Defaults matching the original deployment.
    ///
    /// | Field               | Default          |
    /// |---------------------|------------------|
    /// | listen_addr         | `0.0.0.0:8087`   |
    /// | upstream_addr       | `127.0.0.1:8011` |
    /// | queue_capacity      | 100              |
    /// | overflow            | `Block`          |
    /// | reconnect_delay     | 1 second         |
    /// | client_read_timeout | 60 seconds       |
    /// | read_buffer_size    | 1024 bytes       |
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address strings.
            listen_addr: "0.0.0.0:8087".parse().unwrap(),
            upstream_addr: "127.0.0.1:8011".parse().unwrap(),
            queue_capacity: 100,
            overflow: OverflowPolicy::Block,
            reconnect_delay: Duration::from_secs(1),
            client_read_timeout: Duration::from_secs(60),
            read_buffer_size: 1024,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
