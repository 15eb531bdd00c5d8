//! Shared data model for chunkvault.
//!
//! Types in this crate cross crate boundaries: the manifest document
//! written by `chunkvault-manifest`, and the events the orchestrators
//! hand to whatever front end is listening.

pub mod events;
pub mod types;

// Re-export primary types for convenience.
pub use events::TransferEvent;
pub use types::{Direction, FileStatus, ManifestEntry, OperationId};
