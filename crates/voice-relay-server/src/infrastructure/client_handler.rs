//! Per-connection client handler.
//!
//! Each accepted client connection gets one handler task.  The handler owns
//! the connection, runs a bounded-buffer read loop, classifies every chunk,
//! and publishes the result onto the relay queue tagged with the session
//! identity known so far (empty until the connection's session announce
//! arrives).
//!
//! # Exit rules
//!
//! - Read timeout → the client is stalled; disconnect, no reply.
//! - EOF / closed connection → normal exit, reply is written.
//! - Terminator chunk → publish it, stop reading, reply is written.
//!   The handler never resumes reading after a terminator.
//! - Any other read error → log, exit, no reply (fatal to this handler
//!   only, never to the server).
//! - Queue closed on publish → server shutdown in progress; exit quietly.
//!
//! # The direct reply
//!
//! The reply written back to the client is synthesized from the
//! [`ContentSource`] and is *independent* of whether the upstream relay for
//! this session completed — the upstream response path and the direct-reply
//! path are deliberately decoupled (the reply is a canned fallback).  Two
//! deliberate choices live here:
//!
//! - the reply never waits for (or reflects) the upstream relay, and
//! - a clean EOF earns the reply even though no terminator arrived.  A
//!   client that half-closes after its last payload still gets the fallback;
//!   only a stalled client or a raw read error forfeits it.  (An EOF-ing
//!   client can still read: EOF closes its write side only.)
//!
//! Write failures are logged and ignored; a client that vanished before its
//! reply is not an error.
//!
//! The handler is generic over the stream type so tests can drive it with
//! in-memory streams instead of real sockets.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use voice_relay_core::domain::message::RelayMessage;
use voice_relay_core::domain::reply::ClientReply;
use voice_relay_core::domain::session::SessionTag;
use voice_relay_core::protocol::frame::{classify, InboundFrame};

use crate::application::content::ContentSource;
use crate::domain::config::RelayConfig;
use crate::infrastructure::queue::RelayQueue;

/// How a handler's read loop ended.  Decides whether the reply is written.
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// The client sent a terminator chunk.
    Terminator,
    /// The client closed its write side cleanly.
    Eof,
    /// No data arrived within the configured read timeout.
    TimedOut,
    /// A raw I/O error on the read side.
    ReadError,
    /// The relay queue closed mid-connection (server shutdown).
    QueueClosed,
}

impl ReadOutcome {
    /// The reply is written on the normal exits only; timeout and I/O error
    /// paths skip it.
    fn wants_reply(&self) -> bool {
        matches!(self, ReadOutcome::Terminator | ReadOutcome::Eof)
    }
}

/// Runs one client connection to completion.
///
/// This is the entry point for each per-client task spawned by the acceptor.
/// It never returns an error: every failure mode is local to this connection
/// and is logged here.
pub async fn handle_client<S>(
    stream: S,
    peer: String,
    config: Arc<RelayConfig>,
    queue: RelayQueue,
    content: Arc<dyn ContentSource>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let (outcome, session) = read_loop(&mut reader, &peer, &config, &queue).await;
    debug!(%peer, ?outcome, "client read loop finished");

    if outcome.wants_reply() {
        write_reply(&mut writer, &peer, &session, content.as_ref()).await;
    }
}

/// The bounded-buffer read loop.  Returns how it ended and the session tag
/// established on this connection (empty if no announce arrived).
async fn read_loop<R>(
    reader: &mut R,
    peer: &str,
    config: &RelayConfig,
    queue: &RelayQueue,
) -> (ReadOutcome, SessionTag)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; config.read_buffer_size];
    let mut session = SessionTag::empty();

    loop {
        let n = match timeout(config.client_read_timeout, reader.read(&mut buf)).await {
            Err(_) => {
                info!(%peer, "client timed out; disconnecting");
                return (ReadOutcome::TimedOut, session);
            }
            Ok(Ok(0)) => {
                debug!(%peer, "client disconnected (EOF)");
                return (ReadOutcome::Eof, session);
            }
            Ok(Err(e)) => {
                warn!(%peer, "unexpected read error: {e}");
                return (ReadOutcome::ReadError, session);
            }
            Ok(Ok(n)) => n,
        };

        match classify(&buf[..n]) {
            InboundFrame::SessionAnnounce { session_id } => {
                debug!(%peer, session = %session_id, "session announce received");
                session = SessionTag::derive(&session_id);
                if !queue.publish(RelayMessage::announce(session.clone())).await {
                    return (ReadOutcome::QueueClosed, session);
                }
            }
            InboundFrame::Terminator => {
                debug!(%peer, session = %session.session_id, "terminator received");
                if !queue
                    .publish(RelayMessage::terminator(session.clone()))
                    .await
                {
                    return (ReadOutcome::QueueClosed, session);
                }
                // The read loop never resumes after a terminator.
                return (ReadOutcome::Terminator, session);
            }
            InboundFrame::Payload(bytes) => {
                if !queue
                    .publish(RelayMessage::payload(session.clone(), bytes))
                    .await
                {
                    return (ReadOutcome::QueueClosed, session);
                }
            }
        }
    }
}

/// Synthesizes the fixed-shape reply and writes it as one JSON object
/// terminated by a newline.  Failures are logged, never propagated — this
/// reply is best-effort by contract.
async fn write_reply<W>(writer: &mut W, peer: &str, session: &SessionTag, content: &dyn ContentSource)
where
    W: AsyncWrite + Unpin,
{
    let context = content.reply_context(session);
    let reply = ClientReply::from_context(&context, content.audio_url(session));

    let mut bytes = match serde_json::to_vec(&reply) {
        Ok(b) => b,
        Err(e) => {
            warn!(%peer, "reply serialization failed: {e}");
            return;
        }
    };
    bytes.push(b'\n');

    debug!(%peer, session = %session.session_id, "writing direct reply to client");
    if let Err(e) = writer.write_all(&bytes).await {
        warn!(%peer, "error responding to client: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::application::content::CannedCatalog;
    use crate::domain::config::OverflowPolicy;

    fn test_config() -> Arc<RelayConfig> {
        Arc::new(RelayConfig {
            client_read_timeout: Duration::from_millis(200),
            ..RelayConfig::default()
        })
    }

    /// The exact reply bytes the handler writes for a given session.
    fn expected_reply(session: &SessionTag) -> Vec<u8> {
        let catalog = CannedCatalog;
        let context = catalog.reply_context(session);
        let reply = ClientReply::from_context(&context, catalog.audio_url(session));
        let mut bytes = serde_json::to_vec(&reply).unwrap();
        bytes.push(b'\n');
        bytes
    }

    #[tokio::test]
    async fn test_announce_then_terminator_publishes_both_and_replies() {
        // Arrange: a scripted stream — announce chunk, terminator chunk,
        // then the handler must write exactly the canned reply.
        let session = SessionTag::derive("abc-123");
        let stream = tokio_test::io::Builder::new()
            .read(b"session:abc-123")
            .read(b"END")
            .write(&expected_reply(&session))
            .build();

        let (queue, mut rx) = RelayQueue::new(8, OverflowPolicy::Block);

        // Act
        handle_client(
            stream,
            "test-client".to_string(),
            test_config(),
            queue,
            Arc::new(CannedCatalog),
        )
        .await;

        // Assert: exactly one announce and one terminator, both tagged.
        let announce = rx.recv().await.unwrap();
        assert_eq!(announce, RelayMessage::announce(session.clone()));
        assert_eq!(announce.session.customer_id, "abc");

        let terminator = rx.recv().await.unwrap();
        assert_eq!(terminator, RelayMessage::terminator(session));

        assert!(rx.try_recv().is_err(), "read loop must stop after terminator");
    }

    #[tokio::test]
    async fn test_payload_chunks_carry_the_announced_tag_in_order() {
        let session = SessionTag::derive("cust-9");
        let stream = tokio_test::io::Builder::new()
            .read(b"session:cust-9")
            .read(b"first")
            .read(b"second")
            .read(b"END")
            .write(&expected_reply(&session))
            .build();

        let (queue, mut rx) = RelayQueue::new(8, OverflowPolicy::Block);
        handle_client(
            stream,
            "test-client".to_string(),
            test_config(),
            queue,
            Arc::new(CannedCatalog),
        )
        .await;

        assert_eq!(rx.recv().await.unwrap(), RelayMessage::announce(session.clone()));
        assert_eq!(
            rx.recv().await.unwrap(),
            RelayMessage::payload(session.clone(), b"first".to_vec())
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            RelayMessage::payload(session.clone(), b"second".to_vec())
        );
        assert_eq!(rx.recv().await.unwrap(), RelayMessage::terminator(session));
    }

    #[tokio::test]
    async fn test_payload_before_announce_carries_empty_tag() {
        let stream = tokio_test::io::Builder::new()
            .read(b"early")
            .read(b"END")
            .write(&expected_reply(&SessionTag::empty()))
            .build();

        let (queue, mut rx) = RelayQueue::new(8, OverflowPolicy::Block);
        handle_client(
            stream,
            "test-client".to_string(),
            test_config(),
            queue,
            Arc::new(CannedCatalog),
        )
        .await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first, RelayMessage::payload(SessionTag::empty(), b"early".to_vec()));
        assert!(!first.session.is_announced());
    }

    #[tokio::test]
    async fn test_clean_eof_still_writes_the_reply() {
        // Arrange: a duplex pair.  The "client" sends one payload chunk and
        // shuts down its write side; the handler must publish the chunk, see
        // EOF, and still write the canned reply.
        let (mut client, server) = tokio::io::duplex(4096);

        let (queue, mut rx) = RelayQueue::new(8, OverflowPolicy::Block);
        let handler = tokio::spawn(handle_client(
            server,
            "test-client".to_string(),
            test_config(),
            queue,
            Arc::new(CannedCatalog) as Arc<dyn ContentSource>,
        ));

        // Act
        client.write_all(b"hello").await.unwrap();
        client.shutdown().await.unwrap(); // EOF towards the handler

        handler.await.unwrap();

        // Assert: the payload reached the queue...
        assert_eq!(
            rx.recv().await.unwrap(),
            RelayMessage::payload(SessionTag::empty(), b"hello".to_vec())
        );

        // ...and a complete JSON reply came back.
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, expected_reply(&SessionTag::empty()));
    }

    #[tokio::test]
    async fn test_stalled_client_is_abandoned_without_reply() {
        // Arrange: a client that never sends anything.
        let (mut client, server) = tokio::io::duplex(4096);

        let config = Arc::new(RelayConfig {
            client_read_timeout: Duration::from_millis(50),
            ..RelayConfig::default()
        });
        let (queue, mut rx) = RelayQueue::new(8, OverflowPolicy::Block);

        // Act: the handler must give up on its own.
        handle_client(
            server,
            "test-client".to_string(),
            config,
            queue,
            Arc::new(CannedCatalog) as Arc<dyn ContentSource>,
        )
        .await;

        // Assert: nothing was published and nothing was written back.
        assert!(rx.recv().await.is_none());
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.is_empty(), "stalled clients get no reply");
    }

    #[tokio::test]
    async fn test_queue_closed_is_quiet_shutdown() {
        // Arrange: the dispatcher side is already gone.
        let (queue, rx) = RelayQueue::new(8, OverflowPolicy::Block);
        drop(rx);

        let (mut client, server) = tokio::io::duplex(4096);

        let handler = tokio::spawn(handle_client(
            server,
            "test-client".to_string(),
            test_config(),
            queue,
            Arc::new(CannedCatalog) as Arc<dyn ContentSource>,
        ));

        // Act: one chunk is enough to hit the closed queue.
        client.write_all(b"data").await.unwrap();
        handler.await.unwrap();

        // Assert: no reply — shutdown, not a session end.
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.is_empty());
    }
}
