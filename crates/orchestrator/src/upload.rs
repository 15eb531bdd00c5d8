//! Sequential chunked upload of one file.

use std::path::Path;

use chunkvault_manifest::Manifest;
use chunkvault_protocol::{Direction, FileStatus, ManifestEntry, OperationId};
use chunkvault_transfer::{ChunkReader, TransferProgress, chunk_label, file_name_of};
use tracing::{debug, info, warn};

use crate::error::VaultError;
use crate::events::EventReporter;
use crate::store::{AttachmentStore, container_name};

/// Uploads a single file as ordered chunk attachments.
pub struct Upload<'a> {
    store: &'a dyn AttachmentStore,
    manifest: &'a Manifest,
    events: &'a EventReporter,
    chunk_size: usize,
}

impl<'a> Upload<'a> {
    /// Creates an upload. A `chunk_size` of 0 uses the default (10 MiB).
    pub fn new(
        store: &'a dyn AttachmentStore,
        manifest: &'a Manifest,
        events: &'a EventReporter,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            manifest,
            events,
            chunk_size,
        }
    }

    /// Runs the full upload for `path`.
    ///
    /// Emits one progress event per chunk, then either `UploadComplete` or a
    /// single `Error`. Chunks are sent strictly one at a time so the recorded
    /// handle order always matches the byte order of the file.
    ///
    /// On failure no manifest entry is written. Chunks already sent stay in
    /// the remote container.
    pub async fn run(
        &self,
        path: &Path,
        operation_id: &OperationId,
    ) -> Result<ManifestEntry, VaultError> {
        match self.transfer(path, operation_id).await {
            Ok(entry) => {
                self.events.upload_complete(operation_id, &entry.file_name).await;
                Ok(entry)
            }
            Err(e) => {
                warn!(
                    operation = %operation_id,
                    path = %path.display(),
                    error = %e,
                    "upload failed"
                );
                self.events.error(operation_id, Direction::Upload, e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        path: &Path,
        operation_id: &OperationId,
    ) -> Result<ManifestEntry, VaultError> {
        if path.as_os_str().is_empty() {
            return Err(VaultError::InvalidRequest("file path is missing".into()));
        }

        // 1. Open the file
        let mut reader = ChunkReader::open(path, self.chunk_size).await?;
        let file_name = file_name_of(path)?;
        let file_size = reader.file_size();
        let mut progress =
            TransferProgress::new(operation_id.clone(), Direction::Upload, reader.total_chunks());

        info!(
            operation = %operation_id,
            file = %file_name,
            bytes = file_size,
            chunks = progress.total_units(),
            "uploading file"
        );

        // 2. Resolve the channel
        let channel_id = self
            .store
            .ensure_container(&container_name(&file_name))
            .await?;

        // 3. Send chunks in order
        let mut message_ids = Vec::with_capacity(progress.total_units());
        while let Some(chunk) = reader.next_chunk().await? {
            let label = chunk_label(&file_name, chunk.number());
            let size = chunk.len();
            let handle = self.store.send_blob(&channel_id, &label, chunk.data).await?;

            debug!(
                operation = %operation_id,
                chunk = %label,
                bytes = size,
                handle = %handle,
                "chunk sent"
            );
            message_ids.push(handle);
            self.events.progress(progress.advance());
        }
        drop(reader);

        // 4. Record the file
        let entry = ManifestEntry {
            file_name,
            file_size,
            status: FileStatus::Uploaded,
            channel_id,
            message_ids,
        };
        self.manifest.upsert(entry.clone()).await?;

        info!(
            operation = %operation_id,
            file = %entry.file_name,
            chunks = entry.chunk_count(),
            "upload complete"
        );
        Ok(entry)
    }
}
