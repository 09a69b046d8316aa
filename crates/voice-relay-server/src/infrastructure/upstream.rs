//! Upstream dispatcher: the single long-lived relay loop.
//!
//! The dispatcher exclusively owns the upstream connection.  It is a
//! two-state machine:
//!
//! ```text
//!            dial ok
//! Disconnected ─────▶ Relaying
//!      ▲  │              │
//!      │  │ dial failed  │ write failed (connection abandoned)
//!      │  ▼ (fixed delay)│
//!      └──◀──────────────┘
//! ```
//!
//! - **Disconnected**: dial the configured upstream address; on failure wait
//!   a fixed delay and retry indefinitely.  This is the system's only retry
//!   policy — unbounded retries, fixed backoff, no jitter, no cap.
//! - **Relaying**: consume the relay queue in strict FIFO order and write
//!   each message upstream.  Any write error abandons the connection and
//!   returns to Disconnected; the failed message is *not* redelivered
//!   (at-most-once delivery per connection epoch).
//!
//! # Priming
//!
//! The first message in a connection's lifetime that carries a session tag
//! triggers the priming prologue — the session line followed by the
//! capability line — written at most once per upstream *connection*, not
//! once per session.  A reconnect resets the priming flag.
//!
//! # Termination
//!
//! The loop ends only when the relay queue is closed and drained (server
//! shutdown).  Messages queued while Disconnected stay queued and are
//! drained in original order once a dial succeeds.

use std::io;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use voice_relay_core::domain::message::RelayMessage;
use voice_relay_core::protocol::frame::InboundFrame;
use voice_relay_core::protocol::framing::{
    encode_search_request, session_line, CAPABILITY_LINE, REQUEST_END_MARK, STREAM_END_MARK,
};

use crate::application::content::ContentSource;
use crate::domain::config::RelayConfig;

/// Why a Relaying epoch ended.
enum EpochEnd {
    /// The queue is closed and drained — terminal for the dispatcher.
    QueueDrained,
    /// The upstream connection failed; go back to Disconnected.
    ConnectionLost,
}

/// Consumes the relay queue and maintains the upstream connection.
pub struct UpstreamDispatcher {
    config: Arc<RelayConfig>,
    rx: mpsc::Receiver<RelayMessage>,
    content: Arc<dyn ContentSource>,
}

impl UpstreamDispatcher {
    pub fn new(
        config: Arc<RelayConfig>,
        rx: mpsc::Receiver<RelayMessage>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self {
            config,
            rx,
            content,
        }
    }

    /// Runs the dispatcher until the relay queue is closed and drained.
    ///
    /// Spawn this on its own task at startup; it is effectively permanent
    /// until shutdown.
    pub async fn run(mut self) {
        loop {
            // Disconnected state.  Check for terminal shutdown first so a
            // dispatcher that never manages to dial still stops once the
            // queue is gone.
            if self.rx.is_closed() && self.rx.is_empty() {
                break;
            }

            let stream = match TcpStream::connect(self.config.upstream_addr).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(
                        "upstream dial to {} failed: {e}; retrying in {:?}",
                        self.config.upstream_addr, self.config.reconnect_delay
                    );
                    sleep(self.config.reconnect_delay).await;
                    continue;
                }
            };

            info!("connected to upstream at {}", self.config.upstream_addr);

            // Relaying state.
            match self.relay_epoch(stream).await {
                EpochEnd::QueueDrained => break,
                EpochEnd::ConnectionLost => continue,
            }
        }

        info!("relay queue closed and drained; upstream dispatcher stopped");
    }

    /// One Relaying epoch: consume messages until the queue drains or the
    /// connection fails.  Dropping `stream` on exit closes the connection.
    async fn relay_epoch(&mut self, mut stream: TcpStream) -> EpochEnd {
        // Priming is per connection lifetime, so the flag lives here.
        let mut primed = false;

        while let Some(msg) = self.rx.recv().await {
            if let Err(e) = self.write_message(&mut stream, &msg, &mut primed).await {
                // Broken pipe gets its own log line for operability, but the
                // recovery is identical: abandon the connection and redial.
                if e.kind() == io::ErrorKind::BrokenPipe {
                    warn!("broken pipe on upstream connection; reconnecting");
                } else {
                    warn!("upstream write failed: {e}; reconnecting");
                }
                // The failed message is dropped, not redelivered.
                return EpochEnd::ConnectionLost;
            }
        }

        EpochEnd::QueueDrained
    }

    /// Writes one message upstream, priming the connection first if this is
    /// the first tagged message of the epoch.
    async fn write_message(
        &self,
        stream: &mut TcpStream,
        msg: &RelayMessage,
        primed: &mut bool,
    ) -> io::Result<()> {
        if !*primed && msg.session.is_announced() {
            stream.write_all(&session_line(&msg.session.session_id)).await?;
            stream.write_all(CAPABILITY_LINE).await?;
            *primed = true;
            debug!(
                session = %msg.session.session_id,
                "upstream connection primed"
            );
        }

        match &msg.frame {
            // The announce itself carries nothing beyond the priming above.
            InboundFrame::SessionAnnounce { .. } => {}

            InboundFrame::Payload(bytes) if bytes.is_empty() => {}
            InboundFrame::Payload(bytes) => stream.write_all(bytes).await?,

            InboundFrame::Terminator => {
                stream.write_all(STREAM_END_MARK).await?;

                let request = self.content.search_request(&msg.session);
                // A serialization failure takes the same path as a socket
                // failure: abandon the connection and redial.
                let body = encode_search_request(&request)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                stream.write_all(&body).await?;

                stream.write_all(REQUEST_END_MARK).await?;
                debug!(
                    session = %msg.session.session_id,
                    "terminator trailer written upstream"
                );
            }
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// Connection-level behavior (redial, priming across reconnects, FIFO drain)
// is exercised against real sockets in `tests/relay_integration.rs`; the
// tests here cover the state transitions that don't need a peer.
