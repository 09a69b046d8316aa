//! voice-relay-server library crate.
//!
//! A TCP relay that decouples many short-lived voice-client sockets from one
//! long-lived connection to the voice-to-action service.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Voice client (plain text chunks over TCP)
//!         ↕
//! [voice-relay-server]
//!   ├── domain/           RelayConfig, overflow policy
//!   ├── application/      ContentSource — the content-generation collaborator seam
//!   └── infrastructure/
//!         ├── queue/          bounded relay queue (handlers → dispatcher)
//!         ├── acceptor/       TCP accept loop, one task per client
//!         ├── client_handler/ per-connection read loop + direct reply
//!         └── upstream/       persistent upstream connection with redial
//!         ↕
//! voice-to-action service (line prologue + raw payload + JSON trailers over TCP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async; plain configuration data.
//! - `application` depends on `domain` and `voice-relay-core` only.
//! - `infrastructure` depends on everything plus `tokio`.
//!
//! The relay queue is the only resource shared across tasks.  It is created
//! once at startup, handed to the acceptor (producer side) and the dispatcher
//! (consumer side), and closed exactly once at shutdown when the last
//! producer handle is dropped.

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: the content-generation collaborator boundary.
pub mod application;

/// Infrastructure layer: sockets, tasks, and the relay queue.
pub mod infrastructure;
