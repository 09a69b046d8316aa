//! Protocol module: inbound chunk classification and upstream wire framing.

pub mod frame;
pub mod framing;

pub use frame::{classify, InboundFrame};
pub use framing::WireError;
