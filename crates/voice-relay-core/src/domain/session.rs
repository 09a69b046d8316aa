//! Session identity.
//!
//! A session is one logical client interaction, identified by the id the
//! client announces with its first `"session:"` control chunk.  The customer
//! id is derived from the session id, never transmitted separately: it is
//! the portion of the session id before the first `-` separator (session ids
//! follow a `<customer>-<suffix>` convention).

/// Identity carried by every relayed message.
///
/// A connection starts with [`SessionTag::empty`] and switches to a derived
/// tag when its session announce arrives; every message published afterwards
/// carries that same tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionTag {
    /// Globally unique id for this logical session, announced by the client.
    /// Empty until the connection's session announce has been received.
    pub session_id: String,

    /// The portion of `session_id` before the first `-`.
    ///
    /// Empty when the session id carries no separator — a missing separator
    /// is a degraded tag, never an error.
    pub customer_id: String,
}

impl SessionTag {
    /// The tag of a connection that has not yet announced a session.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derives a tag from an announced session id.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use voice_relay_core::domain::session::SessionTag;
    ///
    /// let tag = SessionTag::derive("abc-123");
    /// assert_eq!(tag.customer_id, "abc");
    ///
    /// // No separator → empty customer id, not an error.
    /// assert_eq!(SessionTag::derive("abc123").customer_id, "");
    /// ```
    pub fn derive(session_id: &str) -> Self {
        let customer_id = match session_id.find('-') {
            Some(pos) => session_id[..pos].to_string(),
            None => String::new(),
        };
        Self {
            session_id: session_id.to_string(),
            customer_id,
        }
    }

    /// Whether a session has been announced on this connection yet.
    pub fn is_announced(&self) -> bool {
        !self.session_id.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
