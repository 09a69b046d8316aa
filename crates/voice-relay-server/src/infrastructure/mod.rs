//! Infrastructure layer: sockets, tasks, and the relay queue.

pub mod acceptor;
pub mod client_handler;
pub mod queue;
pub mod upstream;

pub use acceptor::RelayServer;
pub use queue::RelayQueue;
pub use upstream::UpstreamDispatcher;
