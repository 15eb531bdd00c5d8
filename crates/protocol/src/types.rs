use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal state of a stored file.
///
/// Only `Uploaded` is ever persisted; in-flight state lives in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    #[serde(rename = "uploaded")]
    Uploaded,
}

/// One file recorded in the manifest.
///
/// Field names match the `uploads.json` layout so existing documents
/// load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Basename of the uploaded file; unique within the manifest.
    pub file_name: String,
    /// Size in bytes at upload time.
    pub file_size: u64,
    pub status: FileStatus,
    /// Remote channel holding this file's chunks.
    #[serde(rename = "channelId")]
    pub channel_id: String,
    /// Chunk handles in upload order. Index `i` is chunk `i` of the file.
    #[serde(rename = "messageIds")]
    pub message_ids: Vec<String>,
}

impl ManifestEntry {
    /// Number of chunks recorded for this file.
    pub fn chunk_count(&self) -> usize {
        self.message_ids.len()
    }

    /// Returns `true` if the entry has everything a download needs.
    pub fn is_downloadable(&self) -> bool {
        !self.channel_id.is_empty() && (self.file_size == 0 || !self.message_ids.is_empty())
    }
}

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "upload")]
    Upload,
    #[serde(rename = "download")]
    Download,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Upload => "upload",
            Direction::Download => "download",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation token tagging every event of one upload or download.
///
/// Backed by a random UUID so operations started at the same instant
/// never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Generates a fresh, collision-resistant id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for OperationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OperationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
