//! Domain types for the voice relay.
//!
//! Pure business types with no I/O, async, or framework dependencies.
//! Everything here can be constructed and inspected in a plain unit test.

pub mod message;
pub mod reply;
pub mod session;

pub use message::RelayMessage;
pub use session::SessionTag;
