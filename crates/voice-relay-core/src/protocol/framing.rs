//! Upstream wire framing.
//!
//! The upstream voice-to-action service speaks a line-oriented text prologue
//! followed by raw payload bytes and JSON trailers:
//!
//! ```text
//! session:<sessionId>\n          ┐ priming — written once per upstream
//! name_api:voice_to_action\n     ┘ connection, before the first payload
//! <raw payload bytes>...
//! END1                           ┐
//! {"product_name":...}           │ terminator trailer — written when a
//! END2                           ┘ session's stream ends
//! ```
//!
//! This module renders those byte sequences.  It performs no I/O; the
//! dispatcher decides when each piece is written.

use thiserror::Error;

use crate::domain::reply::SearchRequest;

/// Capability line announced to the upstream service during priming.
pub const CAPABILITY_LINE: &[u8] = b"name_api:voice_to_action\n";

/// Literal marker written upstream after a session's final payload.
pub const STREAM_END_MARK: &[u8] = b"END1";

/// Literal marker written upstream after the serialized search request.
pub const REQUEST_END_MARK: &[u8] = b"END2";

/// Errors that can occur while rendering upstream wire bytes.
///
/// These are encoding failures, not I/O errors; I/O errors belong to the
/// dispatcher that owns the socket.
#[derive(Debug, Error)]
pub enum WireError {
    /// The search request could not be serialized to JSON.
    #[error("search request serialization failed: {0}")]
    SearchRequest(#[from] serde_json::Error),
}

/// Renders the newline-terminated session announce line.
///
/// # Example
///
/// ```rust
/// use voice_relay_core::protocol::framing::session_line;
///
/// assert_eq!(session_line("abc-123"), b"session:abc-123\n");
/// ```
pub fn session_line(session_id: &str) -> Vec<u8> {
    format!("session:{session_id}\n").into_bytes()
}

/// Serializes the terminator-trailer search request to its JSON wire bytes.
///
/// # Errors
///
/// Returns [`WireError::SearchRequest`] if serialization fails.
pub fn encode_search_request(request: &SearchRequest) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(request)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
