//! Classification of inbound client chunks.
//!
//! The client-facing protocol is deliberately loose: clients send plain text
//! chunks, and two control tokens are recognized anywhere inside a chunk:
//!
//! - `"session:"` followed by a session identifier (the *session announce*)
//! - `"END"` (the *terminator*, end of this session's payload stream)
//!
//! Everything else is opaque payload forwarded verbatim.
//!
//! Rather than scattering substring checks across the read loop, a chunk is
//! decoded exactly once into the closed set of [`InboundFrame`] variants.
//! Precedence is fixed: session announce is checked before terminator before
//! falling through to payload, so a single chunk can never classify as two
//! kinds at once (e.g. a session id that itself contains `"END"` is still an
//! announce).
//!
//! Classification never fails.  Malformed control content degrades to empty
//! fields; a connection is never aborted because of unparsable control text.

/// Token that introduces a session identifier inside a chunk.
pub const SESSION_MARKER: &str = "session:";

/// Token that marks the end of a session's payload stream.
pub const TERMINATOR_TOKEN: &str = "END";

/// The closed set of things an inbound chunk can be.
///
/// One chunk classifies as exactly one variant; see module docs for the
/// precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// The chunk carried a `"session:"` marker.
    ///
    /// `session_id` is the whitespace-trimmed text after the first marker
    /// occurrence.  It may be empty if the marker was the last thing in the
    /// chunk — that is not an error.
    SessionAnnounce {
        /// Trimmed identifier announced by the client.
        session_id: String,
    },

    /// The chunk carried the `"END"` token (and no session marker).
    Terminator,

    /// Anything else: opaque bytes to forward upstream verbatim.
    Payload(Vec<u8>),
}

/// Classifies a raw inbound chunk.
///
/// The control tokens are textual, so the chunk is inspected through a lossy
/// UTF-8 view; payload chunks keep their original bytes untouched.
///
/// # Examples
///
/// ```rust
/// use voice_relay_core::protocol::frame::{classify, InboundFrame};
///
/// assert_eq!(
///     classify(b"session: abc-123 "),
///     InboundFrame::SessionAnnounce { session_id: "abc-123".to_string() }
/// );
/// assert_eq!(classify(b"END"), InboundFrame::Terminator);
/// assert_eq!(classify(b"hello"), InboundFrame::Payload(b"hello".to_vec()));
/// ```
pub fn classify(chunk: &[u8]) -> InboundFrame {
    // Control tokens are ASCII, so a lossy view is safe: any byte sequence
    // that contains the marker bytes also contains them after lossy decoding.
    let text = String::from_utf8_lossy(chunk);

    if let Some(pos) = text.find(SESSION_MARKER) {
        let session_id = text[pos + SESSION_MARKER.len()..].trim().to_string();
        return InboundFrame::SessionAnnounce { session_id };
    }

    if text.contains(TERMINATOR_TOKEN) {
        return InboundFrame::Terminator;
    }

    InboundFrame::Payload(chunk.to_vec())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_announce_extracts_trimmed_id() {
        // Arrange: marker followed by an id with surrounding whitespace
        let chunk = b"session:  abc-123 \n";

        // Act
        let frame = classify(chunk);

        // Assert
        assert_eq!(
            frame,
            InboundFrame::SessionAnnounce {
                session_id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_session_marker_recognized_mid_chunk() {
        // The marker can appear anywhere in the chunk, not only at the start.
        let frame = classify(b"noise session:xyz-9");
        assert_eq!(
            frame,
            InboundFrame::SessionAnnounce {
                session_id: "xyz-9".to_string()
            }
        );
    }

    #[test]
    fn test_session_marker_with_no_id_yields_empty_id() {
        // Marker with nothing after it degrades to an empty id, not an error.
        let frame = classify(b"session:");
        assert_eq!(
            frame,
            InboundFrame::SessionAnnounce {
                session_id: String::new()
            }
        );
    }

    #[test]
    fn test_terminator_token_classifies_as_terminator() {
        assert_eq!(classify(b"END"), InboundFrame::Terminator);
    }

    #[test]
    fn test_terminator_recognized_mid_chunk() {
        assert_eq!(classify(b"...END..."), InboundFrame::Terminator);
    }

    #[test]
    fn test_announce_takes_precedence_over_terminator() {
        // A chunk containing both tokens must classify as an announce —
        // the id here literally contains "END" and must survive intact.
        let frame = classify(b"session:END-7");
        assert_eq!(
            frame,
            InboundFrame::SessionAnnounce {
                session_id: "END-7".to_string()
            }
        );
    }

    #[test]
    fn test_announce_wins_even_when_terminator_comes_first_in_chunk() {
        let frame = classify(b"END session:abc-1");
        assert_eq!(
            frame,
            InboundFrame::SessionAnnounce {
                session_id: "abc-1".to_string()
            }
        );
    }

    #[test]
    fn test_plain_bytes_classify_as_payload() {
        let frame = classify(b"hello world");
        assert_eq!(frame, InboundFrame::Payload(b"hello world".to_vec()));
    }

    #[test]
    fn test_payload_preserves_original_bytes_even_when_not_utf8() {
        // Non-UTF-8 payloads must be forwarded verbatim; classification only
        // uses the lossy view for token search.
        let chunk: &[u8] = &[0xFF, 0xFE, 0x01, 0x02];
        assert_eq!(classify(chunk), InboundFrame::Payload(chunk.to_vec()));
    }

    #[test]
    fn test_lowercase_end_is_payload() {
        // Token matching is case-sensitive, same as the wire contract.
        let frame = classify(b"end");
        assert_eq!(frame, InboundFrame::Payload(b"end".to_vec()));
    }

    #[test]
    fn test_empty_chunk_is_empty_payload() {
        assert_eq!(classify(b""), InboundFrame::Payload(Vec::new()));
    }
}
