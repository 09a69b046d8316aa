//! The content-generation collaborator boundary.
//!
//! The relay itself never interprets message content.  Response bodies and
//! the product catalogue come from an external content generator; this
//! module defines that seam as a trait so the relay can be wired to the real
//! generator service later without touching the handler or dispatcher, and
//! so tests can substitute a fixed implementation.
//!
//! [`CannedCatalog`] is the current production implementation: fixed
//! demonstration content for the pilot store (Vietnamese shop-assistant
//! responses and a small snack catalogue).

use voice_relay_core::domain::reply::{
    ContextItem, NotiData, Product, SearchRequest, VoiceContext,
};
use voice_relay_core::domain::session::SessionTag;

/// Supplies response bodies and search requests for relayed sessions.
///
/// Implementations must be cheap to call; the handler invokes
/// [`ContentSource::reply_context`] once per connection close and the
/// dispatcher invokes [`ContentSource::search_request`] once per terminator.
pub trait ContentSource: Send + Sync {
    /// The conversational context backing the reply for `session`.
    fn reply_context(&self, session: &SessionTag) -> VoiceContext;

    /// Locator of the synthesized audio for the reply.
    fn audio_url(&self, session: &SessionTag) -> String;

    /// The product-name search request sent upstream after `session`'s
    /// terminator.
    fn search_request(&self, session: &SessionTag) -> SearchRequest;
}

/// Fixed demonstration content for the pilot store.
///
/// Every session receives the same reply and the same search request,
/// regardless of what was said.  This mirrors the staging deployment, where
/// the real content generator sits behind the upstream service and the
/// direct reply is a canned fallback.
#[derive(Debug, Default, Clone)]
pub struct CannedCatalog;

impl ContentSource for CannedCatalog {
    fn reply_context(&self, _session: &SessionTag) -> VoiceContext {
        VoiceContext {
            text_response:
                "Hiện chỉ còn 3 thùng 24 lon coca 340ml, anh lấy tạm trước nhé, hàng về thêm em sẽ báo anh ạ"
                    .to_string(),
            data: vec![ContextItem {
                product_name: "Thùng 24 lon coca 340ml".to_string(),
                sku_id: "1234567890".to_string(),
                available_to_sale: 3,
                change_qty: 0,
                cart_qty: 2,
                min_cart_qty: 0,
                max_cart_qty: 7,
            }],
            action: "UPDATE_CART".to_string(),
            transcript: "Mình muốn mua coca".to_string(),
            noti_data: NotiData::default(),
            is_read_noti: "false".to_string(),
        }
    }

    fn audio_url(&self, _session: &SessionTag) -> String {
        // Pre-rendered TTS stream for the canned response text.
        "https://api.stg.telio.me/zss/v1/tts/stream?q=Coca+320ml+gi%C3%A1+174000+%C4%91%E1%BB%93ng+1+th%C3%B9ng.+Ch%E1%BB%8B+mu%E1%BB%91n+%C4%91%E1%BA%B7t+mua+lu%C3%B4n+ko+%E1%BA%A1%3F"
            .to_string()
    }

    fn search_request(&self, _session: &SessionTag) -> SearchRequest {
        SearchRequest {
            product_name: "coca".to_string(),
            list_products: vec![
                Product {
                    product_name: "Bánh Custas kem trứng - Hộp x 20 bánh (460g)".to_string(),
                    sku: "VN-FM-HXJ-782-001".to_string(),
                },
                Product {
                    product_name: "Bánh Chocopie - Hộp x 20 bánh (600g)".to_string(),
                    sku: "VN-FM-PAJ-104-001".to_string(),
                },
            ],
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
