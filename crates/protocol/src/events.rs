use serde::{Deserialize, Serialize};

use crate::types::{Direction, OperationId};

/// Notification emitted by a running upload or download.
///
/// Every variant carries the [`OperationId`] of the operation that
/// produced it, so a consumer can route events for concurrent transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransferEvent {
    /// One more chunk finished. `percent` is in `0.0..=100.0`.
    Progress {
        operation_id: OperationId,
        direction: Direction,
        percent: f64,
    },
    UploadComplete {
        operation_id: OperationId,
        file_name: String,
    },
    DownloadComplete {
        operation_id: OperationId,
        file_name: String,
        output_path: String,
    },
    /// The operation was aborted. Always the last event of its operation.
    Error {
        operation_id: OperationId,
        direction: Direction,
        message: String,
    },
}

impl TransferEvent {
    pub fn operation_id(&self) -> &OperationId {
        match self {
            TransferEvent::Progress { operation_id, .. }
            | TransferEvent::UploadComplete { operation_id, .. }
            | TransferEvent::DownloadComplete { operation_id, .. }
            | TransferEvent::Error { operation_id, .. } => operation_id,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TransferEvent::Progress { direction, .. } | TransferEvent::Error { direction, .. } => {
                *direction
            }
            TransferEvent::UploadComplete { .. } => Direction::Upload,
            TransferEvent::DownloadComplete { .. } => Direction::Download,
        }
    }

    /// Returns `true` for the event that ends an operation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferEvent::Progress { .. })
    }

    /// Name of the UI channel this event is delivered on.
    pub fn channel(&self) -> &'static str {
        match (self, self.direction()) {
            (TransferEvent::Progress { .. }, Direction::Upload) => "upload-progress",
            (TransferEvent::Progress { .. }, Direction::Download) => "download-progress",
            (TransferEvent::UploadComplete { .. }, _) => "upload-complete",
            (TransferEvent::DownloadComplete { .. }, _) => "download-complete",
            (TransferEvent::Error { .. }, Direction::Upload) => "upload-error",
            (TransferEvent::Error { .. }, Direction::Download) => "download-error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_json_shape() {
        let event = TransferEvent::Progress {
            operation_id: "op-1".into(),
            direction: Direction::Upload,
            percent: 50.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "progress");
        assert_eq!(json["operationId"], "op-1");
        assert_eq!(json["direction"], "upload");
        assert_eq!(json["percent"], 50.0);
    }

    #[test]
    fn download_complete_json_shape() {
        let event = TransferEvent::DownloadComplete {
            operation_id: "op-2".into(),
            file_name: "a.bin".into(),
            output_path: "/tmp/downloads/a.bin".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "downloadComplete");
        assert_eq!(json["fileName"], "a.bin");
        assert_eq!(json["outputPath"], "/tmp/downloads/a.bin");
    }

    #[test]
    fn channels_follow_direction() {
        let up = TransferEvent::Progress {
            operation_id: "op".into(),
            direction: Direction::Upload,
            percent: 1.0,
        };
        let down_err = TransferEvent::Error {
            operation_id: "op".into(),
            direction: Direction::Download,
            message: "boom".into(),
        };
        let done = TransferEvent::UploadComplete {
            operation_id: "op".into(),
            file_name: "a".into(),
        };
        assert_eq!(up.channel(), "upload-progress");
        assert_eq!(down_err.channel(), "download-error");
        assert_eq!(done.channel(), "upload-complete");
        assert!(!up.is_terminal());
        assert!(down_err.is_terminal());
        assert!(done.is_terminal());
    }

    #[test]
    fn event_roundtrip() {
        let event = TransferEvent::Error {
            operation_id: "op-3".into(),
            direction: Direction::Upload,
            message: "file not found: /x".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: TransferEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.operation_id().as_str(), "op-3");
    }
}
