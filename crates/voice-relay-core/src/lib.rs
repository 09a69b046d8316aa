//! # voice-relay-core
//!
//! Shared library for the voice relay containing the inbound control-token
//! classifier, the upstream wire framing, and the domain types that travel
//! between the relay's components.
//!
//! This crate is pure data and encoding logic.  It has zero dependencies on
//! sockets, async runtimes, or OS APIs, which keeps every function here
//! unit-testable without network setup.
//!
//! # Architecture overview
//!
//! The relay sits between many short-lived client connections and one
//! long-lived upstream connection to the voice-to-action service:
//!
//! ```text
//! Client ──▶ frame::classify ──▶ RelayMessage ──▶ (relay queue) ──▶ framing::*  ──▶ Upstream
//!                                                                  (session line,
//!                                                                   END1/END2, JSON)
//! ```
//!
//! - **`protocol`** – How bytes are interpreted and produced on the wire.
//!   Inbound chunks are classified into a closed set of [`InboundFrame`]
//!   variants; outbound bytes for the upstream service are rendered by the
//!   `framing` module.
//!
//! - **`domain`** – Pure business types: the session tag, the relay queue
//!   unit, and the JSON reply/search-request shapes.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `voice_relay_core::RelayMessage` instead of the longer module path.
pub use domain::message::RelayMessage;
pub use domain::reply::{ClientReply, ContextItem, NotiData, Product, SearchRequest, VoiceContext};
pub use domain::session::SessionTag;
pub use protocol::frame::{classify, InboundFrame};
pub use protocol::framing::WireError;
