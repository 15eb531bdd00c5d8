//! Chunked file reading and progress accounting.
//!
//! A file is sliced into fixed-size chunks that are sent one at a time;
//! the chunk index is the only thing tying a stored blob back to its
//! position in the original byte stream.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::{ChunkReader, chunk_label, total_chunks};
pub use progress::{TransferProgress, percent};
pub use types::Chunk;
pub use validation::{file_name_of, validate_file_name};

/// Default chunk size: 10 MiB.
///
/// Stays under the attachment size limit of the remote platform.
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
