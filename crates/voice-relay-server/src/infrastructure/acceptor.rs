//! Client acceptor: TCP accept loop and per-client task management.
//!
//! Owns the listening socket.  Each accepted connection is immediately
//! handed to a dedicated Tokio task running the client handler, so one slow
//! client never blocks the accept loop.  Transient accept failures (e.g.
//! file-descriptor exhaustion) are logged and the loop continues; nothing
//! short of the shutdown flag terminates the acceptor.
//!
//! # Shutdown
//!
//! The loop polls a shared `AtomicBool` between accepts, using a short
//! timeout on `accept()` so the flag is observed within ~200 ms even when
//! no clients are connecting.  When the acceptor returns, its producer
//! handle to the relay queue is dropped; once the last in-flight handler
//! finishes, the queue closes and the upstream dispatcher drains and stops.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{error, info};

use crate::application::content::ContentSource;
use crate::domain::config::RelayConfig;
use crate::infrastructure::client_handler::handle_client;
use crate::infrastructure::queue::RelayQueue;

/// How often the accept loop re-checks the shutdown flag when idle.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// The client-facing TCP server.
///
/// Binding is separated from serving so callers (and tests) can bind port 0
/// and discover the actual address via [`RelayServer::local_addr`] before
/// the accept loop starts.
pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<RelayConfig>,
    queue: RelayQueue,
    content: Arc<dyn ContentSource>,
}

impl RelayServer {
    /// Binds the listener on `config.listen_addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (port in use,
    /// insufficient permissions).
    pub async fn bind(
        config: Arc<RelayConfig>,
        queue: RelayQueue,
        content: Arc<dyn ContentSource>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .with_context(|| format!("failed to bind relay listener on {}", config.listen_addr))?;
        let local_addr = listener
            .local_addr()
            .context("failed to read bound listener address")?;

        info!("voice relay listening on {local_addr}");

        Ok(Self {
            listener,
            local_addr,
            config,
            queue,
            content,
        })
    }

    /// The address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the accept loop until `running` is cleared.
    ///
    /// Consumes the server; when this returns, the listener is closed and
    /// this producer handle to the relay queue is dropped.
    pub async fn serve(self, running: Arc<AtomicBool>) {
        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            // A short timeout on accept() lets the loop observe the shutdown
            // flag even when no clients are connecting.
            match timeout(ACCEPT_POLL_INTERVAL, self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    info!("client connected: {peer_addr}");
                    tokio::spawn(handle_client(
                        stream,
                        peer_addr.to_string(),
                        Arc::clone(&self.config),
                        self.queue.clone(),
                        Arc::clone(&self.content),
                    ));
                }
                Ok(Err(e)) => {
                    // Transient accept error; never terminates the acceptor.
                    error!("accept error: {e}");
                }
                Err(_) => {
                    // Idle window elapsed; loop back to check the flag.
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
