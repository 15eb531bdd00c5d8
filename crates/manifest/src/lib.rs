//! Durable index of stored files.
//!
//! The manifest is a single JSON array of [`ManifestEntry`] records. It is
//! always read and written as a whole document; there are no partial
//! updates.
//!
//! [`ManifestEntry`]: chunkvault_protocol::ManifestEntry

mod error;
mod store;

pub use error::ManifestError;
pub use store::Manifest;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Formats a byte count as GiB with two decimals, e.g. `"1.50"`.
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_GIB)
}
