//! Domain layer for voice-relay-server.
//!
//! Pure configuration types; no I/O, no async, no frameworks.  The
//! infrastructure layer is responsible for populating these from CLI
//! arguments or environment variables.

pub mod config;

pub use config::{OverflowPolicy, RelayConfig};
