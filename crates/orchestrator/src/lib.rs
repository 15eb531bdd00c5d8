//! Chunked upload and download orchestration.
//!
//! This crate implements the **transfer logic** for storing files as
//! ordered chunk attachments on a remote message platform. It has no
//! transport dependencies: front ends provide an [`AttachmentStore`]
//! implementation that talks to the real service.
//!
//! # Upload
//!
//! 1. **Open**: validate the file and slice it into chunks
//! 2. **Container**: get or create the remote channel for the file
//! 3. **Send**: upload chunks one at a time, recording each handle
//! 4. **Record**: upsert the manifest entry
//!
//! # Download
//!
//! 1. **Lookup**: find the manifest entry
//! 2. **Fetch**: retrieve chunks in stored order, appending to the output

pub mod download;
pub mod error;
pub mod events;
pub mod store;
pub mod upload;
pub mod vault;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use download::Download;
pub use error::{StoreError, VaultError};
pub use events::EventReporter;
pub use store::{AttachmentStore, StoreFuture, container_name};
pub use upload::Upload;
pub use vault::{Vault, VaultSettings};
