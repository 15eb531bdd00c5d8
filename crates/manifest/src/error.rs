//! Manifest error types.

/// Errors produced while persisting the manifest.
///
/// Reading never fails: a missing or unparsable document loads as empty.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
