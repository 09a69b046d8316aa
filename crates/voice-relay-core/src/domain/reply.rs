//! JSON shapes for the client-direct reply and the upstream search request.
//!
//! Field names mirror the wire contract of the voice-to-action service and
//! the existing clients exactly — several are inconsistently cased on the
//! wire (`audioUrl` vs `text_response`, `notiData` vs `expireTime`) and the
//! `#[serde(rename)]` attributes preserve that as-is rather than normalizing.
//!
//! # Who produces what
//!
//! - [`VoiceContext`] is what the content collaborator produces for a session.
//! - [`ClientReply`] is the single object the client handler writes back to
//!   its client socket when the read loop ends.
//! - [`SearchRequest`] is the trailer the dispatcher writes upstream between
//!   the `END1` and `END2` markers.

use serde::{Deserialize, Serialize};

/// Full conversational context for one session's reply, as supplied by the
/// content collaborator.  The relay serializes it; it never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceContext {
    /// Conversational text spoken/shown to the customer.
    pub text_response: String,
    /// Structured item data backing the response.
    pub data: Vec<ContextItem>,
    /// Action tag the client app should execute (e.g. `UPDATE_CART`).
    pub action: String,
    /// Transcript of what the customer said.
    pub transcript: String,
    /// Notification scheduling attached to the response.
    #[serde(rename = "notiData")]
    pub noti_data: NotiData,
    /// Whether the notification has been read ("true"/"false" string on the
    /// wire, kept as-is).
    #[serde(rename = "is_read_noti", default)]
    pub is_read_noti: String,
}

/// One product line inside a [`VoiceContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub product_name: String,
    #[serde(rename = "sku")]
    pub sku_id: String,
    #[serde(rename = "ats_quantity")]
    pub available_to_sale: i32,
    #[serde(rename = "change_quantity")]
    pub change_qty: i32,
    #[serde(rename = "cart_quantity")]
    pub cart_qty: i32,
    #[serde(rename = "min_quantity")]
    pub min_cart_qty: i32,
    #[serde(rename = "max_quantity")]
    pub max_cart_qty: i32,
}

/// Notification timing attached to a [`VoiceContext`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotiData {
    #[serde(rename = "notification_time")]
    pub notification_time: i64,
    #[serde(rename = "expireTime")]
    pub expire_time: i64,
}

/// The single object written back to a client when its read loop ends.
///
/// This is a projection of [`VoiceContext`] plus the audio resource locator;
/// the structured item data stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientReply {
    /// Locator of the synthesized speech for `text_response`.
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    pub action: String,
    pub transcript: String,
    pub text_response: String,
}

impl ClientReply {
    /// Projects a [`VoiceContext`] into the client-facing reply shape.
    pub fn from_context(context: &VoiceContext, audio_url: String) -> Self {
        Self {
            audio_url,
            action: context.action.clone(),
            transcript: context.transcript.clone(),
            text_response: context.text_response.clone(),
        }
    }
}

/// Product-name search request sent upstream after a session terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The name being searched for.
    pub product_name: String,
    /// Candidate catalogue entries to match against.
    pub list_products: Vec<Product>,
}

/// One `{name, sku}` pair inside a [`SearchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_name: String,
    pub sku: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
