//! Application layer: the boundary to the content-generation collaborator.

pub mod content;

pub use content::{CannedCatalog, ContentSource};
