//! Event delivery to the front end.

use std::path::Path;

use chunkvault_protocol::{Direction, OperationId, TransferEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

/// Default capacity of the event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Channel slots progress events leave free for terminal events. Capped
/// at half the channel capacity.
pub const TERMINAL_RESERVE: usize = 16;

/// Sends [`TransferEvent`]s to whoever holds the receiving end.
///
/// Progress is fire-and-forget: it is dropped once only
/// [`TERMINAL_RESERVE`] free slots remain or the receiver is gone. Terminal
/// events wait for a free slot, so each operation's completion or error
/// reaches a live receiver even after progress was dropped.
#[derive(Debug, Clone)]
pub struct EventReporter {
    tx: mpsc::Sender<TransferEvent>,
}

impl EventReporter {
    pub fn new(tx: mpsc::Sender<TransferEvent>) -> Self {
        Self { tx }
    }

    /// Creates a reporter together with its receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Emits a progress event without waiting.
    pub fn progress(&self, event: TransferEvent) {
        let reserve = TERMINAL_RESERVE.min(self.tx.max_capacity() / 2);
        if self.tx.capacity() <= reserve {
            trace!(channel = event.channel(), "event channel full, dropping progress");
            return;
        }
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                trace!(channel = event.channel(), "event channel full, dropping progress");
            }
            Err(TrySendError::Closed(event)) => {
                trace!(channel = event.channel(), "no event receiver, dropping event");
            }
        }
    }

    async fn finish(&self, event: TransferEvent) {
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event).await {
            trace!(channel = event.channel(), "no event receiver, dropping event");
        }
    }

    pub async fn upload_complete(&self, operation_id: &OperationId, file_name: &str) {
        self.finish(TransferEvent::UploadComplete {
            operation_id: operation_id.clone(),
            file_name: file_name.to_string(),
        })
        .await;
    }

    pub async fn download_complete(&self, operation_id: &OperationId, file_name: &str, output: &Path) {
        self.finish(TransferEvent::DownloadComplete {
            operation_id: operation_id.clone(),
            file_name: file_name.to_string(),
            output_path: output.display().to_string(),
        })
        .await;
    }

    pub async fn error(&self, operation_id: &OperationId, direction: Direction, message: String) {
        self.finish(TransferEvent::Error {
            operation_id: operation_id.clone(),
            direction,
            message,
        })
        .await;
    }
}
