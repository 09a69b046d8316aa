//! The relay queue unit.

use crate::domain::session::SessionTag;
use crate::protocol::frame::InboundFrame;

/// One unit of relay traffic: a classified inbound frame plus the session
/// identity it belongs to.
///
/// Client handlers publish these onto the relay queue; the upstream
/// dispatcher consumes them in FIFO order.  Messages published before a
/// connection's session announce carry [`SessionTag::empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayMessage {
    /// Session identity known at publish time.
    pub session: SessionTag,
    /// The classified frame.
    pub frame: InboundFrame,
}

impl RelayMessage {
    /// A control-only message recording that a session was announced.
    pub fn announce(session: SessionTag) -> Self {
        let session_id = session.session_id.clone();
        Self {
            session,
            frame: InboundFrame::SessionAnnounce { session_id },
        }
    }

    /// An opaque payload message tagged with the current session.
    pub fn payload(session: SessionTag, bytes: Vec<u8>) -> Self {
        Self {
            session,
            frame: InboundFrame::Payload(bytes),
        }
    }

    /// The end-of-stream message for a session.
    pub fn terminator(session: SessionTag) -> Self {
        Self {
            session,
            frame: InboundFrame::Terminator,
        }
    }

    /// Whether this message ends its session's payload stream.
    pub fn is_terminator(&self) -> bool {
        matches!(self.frame, InboundFrame::Terminator)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announce_carries_session_id_in_frame_and_tag() {
        let msg = RelayMessage::announce(SessionTag::derive("abc-123"));
        assert_eq!(msg.session.session_id, "abc-123");
        assert_eq!(
            msg.frame,
            InboundFrame::SessionAnnounce {
                session_id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_terminator_predicate() {
        assert!(RelayMessage::terminator(SessionTag::empty()).is_terminator());
        assert!(!RelayMessage::payload(SessionTag::empty(), b"x".to_vec()).is_terminator());
    }
}
