//! Transfer error types.

use chunkvault_manifest::ManifestError;
use chunkvault_transfer::TransferError;

/// Errors reported by an [`AttachmentStore`](crate::AttachmentStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The container, blob or its bytes are no longer retrievable.
    #[error("{0}")]
    NotFound(String),

    /// Network or remote-service failure.
    #[error("{0}")]
    TransferFailed(String),
}

/// Errors produced by an upload or download.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("{0}")]
    NotFound(String),

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

impl From<StoreError> for VaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => VaultError::NotFound(msg),
            StoreError::TransferFailed(msg) => VaultError::TransferFailed(msg),
        }
    }
}

impl From<TransferError> for VaultError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Io(e) => VaultError::Io(e),
            TransferError::NotFound(path) => VaultError::NotFound(format!("file not found: {path}")),
            TransferError::InvalidPath(msg) => VaultError::InvalidRequest(msg),
        }
    }
}
