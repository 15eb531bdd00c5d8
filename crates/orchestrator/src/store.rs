//! Remote attachment store trait.
//!
//! `AttachmentStore` is implemented by front ends to bridge the transfer
//! logic to a real service (see `chunkvault-discord`). Keeping it a trait
//! lets the orchestrators run against in-memory mocks in tests.

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

/// Name prefix marking channels created for stored files.
pub const CONTAINER_PREFIX: &str = "upload-";

/// Boxed future returned by [`AttachmentStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Remote grouping of chunk blobs, addressed by opaque string handles.
///
/// Container and blob handles are whatever the service hands back
/// (channel and message ids for Discord); the orchestrators only store
/// and replay them.
pub trait AttachmentStore: Send + Sync {
    /// Returns the container called `name`, creating it if it does not exist.
    fn ensure_container<'a>(&'a self, name: &'a str) -> StoreFuture<'a, String>;

    /// Returns `true` if the container is still present remotely.
    fn container_exists<'a>(&'a self, container: &'a str) -> StoreFuture<'a, bool>;

    /// Uploads one blob named `label` and returns its handle.
    fn send_blob<'a>(
        &'a self,
        container: &'a str,
        label: &'a str,
        data: Vec<u8>,
    ) -> StoreFuture<'a, String>;

    /// Retrieves the bytes of a previously sent blob.
    fn fetch_blob<'a>(&'a self, container: &'a str, blob: &'a str) -> StoreFuture<'a, Vec<u8>>;
}

/// Derives the container name used for `file_name`.
///
/// Lowercased, whitespace runs collapsed to `-`, prefixed with
/// [`CONTAINER_PREFIX`]. The same name is used for lookup and creation so
/// re-uploading a file reuses its channel.
pub fn container_name(file_name: &str) -> String {
    let slug = file_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    format!("{CONTAINER_PREFIX}{slug}")
}
