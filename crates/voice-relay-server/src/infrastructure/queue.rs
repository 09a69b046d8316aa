//! The relay queue: bounded, ordered, multi-producer single-consumer.
//!
//! This is the only resource shared across tasks.  Client handlers hold
//! cloned producer handles; the upstream dispatcher owns the single
//! receiver.  Ordering is FIFO per producer — messages published by one
//! handler arrive at the dispatcher in publish order; interleaving across
//! handlers is up to the scheduler.
//!
//! # Lifecycle
//!
//! Created once at startup via [`RelayQueue::new`].  The queue closes
//! exactly once, at shutdown, when the last producer handle is dropped
//! (the acceptor's handle plus one clone per live client).  After that the
//! dispatcher drains whatever remains and exits.  A publish against a
//! closed queue is a normal shutdown signal, never an error.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use voice_relay_core::domain::message::RelayMessage;

use crate::domain::config::OverflowPolicy;

/// Producer handle to the relay queue.
///
/// Cheap to clone; each client handler gets its own clone so the queue
/// closes naturally when the acceptor and every handler are gone.
#[derive(Clone)]
pub struct RelayQueue {
    tx: mpsc::Sender<RelayMessage>,
    policy: OverflowPolicy,
}

impl RelayQueue {
    /// Creates the queue and returns the producer handle together with the
    /// single consumer receiver (which goes to the dispatcher).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (`tokio::sync::mpsc` requires a bound of
    /// at least 1, and the relay contract requires N ≥ 1 anyway).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> (Self, mpsc::Receiver<RelayMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, policy }, rx)
    }

    /// Publishes one message, honoring the configured overflow policy.
    ///
    /// Returns `false` when the queue is closed — the shutdown signal.  The
    /// caller should stop publishing and wind down; it must not treat this
    /// as an error.
    ///
    /// With [`OverflowPolicy::Block`] a full queue suspends the caller until
    /// the dispatcher drains a slot.  With [`OverflowPolicy::DropNewest`]
    /// the message is discarded (logged) and `true` is returned.
    pub async fn publish(&self, msg: RelayMessage) -> bool {
        match self.policy {
            OverflowPolicy::Block => match self.tx.send(msg).await {
                Ok(()) => true,
                Err(_) => {
                    debug!("relay queue closed; publish treated as shutdown");
                    false
                }
            },
            OverflowPolicy::DropNewest => match self.tx.try_send(msg) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(dropped)) => {
                    warn!(
                        session = %dropped.session.session_id,
                        "relay queue full; dropping newest message"
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("relay queue closed; publish treated as shutdown");
                    false
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
