//! Sequential chunked download of one file.

use std::path::{Path, PathBuf};

use chunkvault_manifest::Manifest;
use chunkvault_protocol::{Direction, ManifestEntry, OperationId};
use chunkvault_transfer::{TransferProgress, validate_file_name};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::VaultError;
use crate::events::EventReporter;
use crate::store::AttachmentStore;

/// Reassembles a stored file from its chunk attachments.
pub struct Download<'a> {
    store: &'a dyn AttachmentStore,
    manifest: &'a Manifest,
    events: &'a EventReporter,
}

impl<'a> Download<'a> {
    pub fn new(
        store: &'a dyn AttachmentStore,
        manifest: &'a Manifest,
        events: &'a EventReporter,
    ) -> Self {
        Self {
            store,
            manifest,
            events,
        }
    }

    /// Downloads `file_name` into `output_dir` and returns the written path.
    ///
    /// Chunks are fetched in the order recorded in the manifest and appended
    /// to the output; the chunks carry no offsets, so this order is the only
    /// thing that makes the result correct.
    ///
    /// If the file is not in the manifest, nothing is created on disk. A
    /// failure after the output was opened leaves the truncated file behind.
    pub async fn run(
        &self,
        file_name: &str,
        output_dir: &Path,
        operation_id: &OperationId,
    ) -> Result<PathBuf, VaultError> {
        match self.transfer(file_name, output_dir, operation_id).await {
            Ok(output) => {
                self.events.download_complete(operation_id, file_name, &output).await;
                Ok(output)
            }
            Err(e) => {
                warn!(
                    operation = %operation_id,
                    file = %file_name,
                    error = %e,
                    "download failed"
                );
                self.events.error(operation_id, Direction::Download, e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        file_name: &str,
        output_dir: &Path,
        operation_id: &OperationId,
    ) -> Result<PathBuf, VaultError> {
        // 1. Lookup
        let entry = self
            .manifest
            .get(file_name)
            .await
            .ok_or_else(|| VaultError::NotFound(format!("no uploaded file named {file_name}")))?;
        if !entry.is_downloadable() {
            return Err(VaultError::NotFound(format!(
                "no channel or message ids recorded for {file_name}"
            )));
        }
        validate_file_name(&entry.file_name)?;

        // 2. Resolve the channel
        if !self.store.container_exists(&entry.channel_id).await? {
            return Err(VaultError::NotFound(format!(
                "channel {} not found for {file_name}",
                entry.channel_id
            )));
        }

        info!(
            operation = %operation_id,
            file = %file_name,
            chunks = entry.chunk_count(),
            "downloading file"
        );

        // 3. Open the output
        tokio::fs::create_dir_all(output_dir).await?;
        let output = output_dir.join(&entry.file_name);
        let mut sink = File::create(&output).await?;

        // 4. Fetch chunks in order. The sink is flushed on every exit path.
        let fetched = self.fetch_into(&entry, &mut sink, operation_id).await;
        let flushed = sink.flush().await;
        drop(sink);
        fetched?;
        flushed?;

        info!(
            operation = %operation_id,
            file = %file_name,
            output = %output.display(),
            "download complete"
        );
        Ok(output)
    }

    async fn fetch_into(
        &self,
        entry: &ManifestEntry,
        sink: &mut File,
        operation_id: &OperationId,
    ) -> Result<(), VaultError> {
        let mut progress = TransferProgress::new(
            operation_id.clone(),
            Direction::Download,
            entry.chunk_count(),
        );

        for message_id in &entry.message_ids {
            let data = self
                .store
                .fetch_blob(&entry.channel_id, message_id)
                .await?;
            sink.write_all(&data).await?;

            debug!(
                operation = %operation_id,
                handle = %message_id,
                bytes = data.len(),
                "chunk written"
            );
            self.events.progress(progress.advance());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStore, drain, pattern, progress_values};
    use crate::upload::Upload;
    use chunkvault_protocol::{FileStatus, TransferEvent};
    use chunkvault_transfer::DEFAULT_CHUNK_SIZE;

    const MIB: usize = 1024 * 1024;

    struct Fixture {
        dir: tempfile::TempDir,
        manifest: Manifest,
        store: MockStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(dir.path().join("uploads.json"));
        Fixture {
            dir,
            manifest,
            store: MockStore::new(),
        }
    }

    async fn upload(fx: &Fixture, name: &str, data: &[u8], chunk_size: usize) -> ManifestEntry {
        let src = fx.dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        let path = src.join(name);
        std::fs::write(&path, data).unwrap();

        let (events, _rx) = EventReporter::channel(64);
        Upload::new(&fx.store, &fx.manifest, &events, chunk_size)
            .run(&path, &OperationId::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn download_25_mib_roundtrip() {
        let fx = fixture();
        let original = pattern(25 * MIB);
        let entry = upload(&fx, "movie.mkv", &original, DEFAULT_CHUNK_SIZE).await;

        let out_dir = fx.dir.path().join("downloads");
        let (events, mut rx) = EventReporter::channel(64);
        let op = OperationId::new();
        let output = Download::new(&fx.store, &fx.manifest, &events)
            .run("movie.mkv", &out_dir, &op)
            .await
            .unwrap();

        assert_eq!(fx.store.fetched(), entry.message_ids);
        assert_eq!(output, out_dir.join("movie.mkv"));
        let written = std::fs::read(&output).unwrap();
        assert_eq!(written.len(), 25 * MIB);
        assert!(written == original);

        let events = drain(&mut rx);
        let progress = progress_values(&events);
        assert_eq!(progress.len(), 3);
        assert!((progress[2] - 100.0).abs() < f64::EPSILON);
        let completes: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, TransferEvent::DownloadComplete { .. }))
            .collect();
        assert_eq!(completes.len(), 1);
        assert_eq!(
            *completes[0],
            TransferEvent::DownloadComplete {
                operation_id: op,
                file_name: "movie.mkv".into(),
                output_path: output.display().to_string(),
            }
        );
    }

    #[tokio::test]
    async fn roundtrip_uneven_sizes() {
        for (size, chunk) in [(1usize, 1usize), (7, 3), (64, 16), (1000, 999), (4097, 4096)] {
            let fx = fixture();
            let original = pattern(size);
            let entry = upload(&fx, "blob.bin", &original, chunk).await;
            assert_eq!(entry.message_ids.len(), size.div_ceil(chunk));

            let (events, _rx) = EventReporter::channel(8);
            let output = Download::new(&fx.store, &fx.manifest, &events)
                .run("blob.bin", &fx.dir.path().join("out"), &OperationId::new())
                .await
                .unwrap();
            assert_eq!(std::fs::read(output).unwrap(), original);
        }
    }

    #[tokio::test]
    async fn unknown_file_creates_nothing() {
        let fx = fixture();
        let out_dir = fx.dir.path().join("downloads");
        let (events, mut rx) = EventReporter::channel(8);

        let result = Download::new(&fx.store, &fx.manifest, &events)
            .run("ghost.bin", &out_dir, &OperationId::new())
            .await;

        assert!(matches!(result, Err(VaultError::NotFound(_))));
        assert!(!out_dir.exists());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel(), "download-error");
    }

    #[tokio::test]
    async fn unknown_file_leaves_existing_output_untouched() {
        let fx = fixture();
        let out_dir = fx.dir.path().join("downloads");
        std::fs::create_dir_all(&out_dir).unwrap();
        std::fs::write(out_dir.join("ghost.bin"), b"keep me").unwrap();
        let (events, _rx) = EventReporter::channel(8);

        let result = Download::new(&fx.store, &fx.manifest, &events)
            .run("ghost.bin", &out_dir, &OperationId::new())
            .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(out_dir.join("ghost.bin")).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn missing_channel_is_not_found() {
        let fx = fixture();
        let entry = upload(&fx, "a.bin", &pattern(20), 10).await;
        fx.store.remove_container(&entry.channel_id);
        let out_dir = fx.dir.path().join("downloads");
        let (events, _rx) = EventReporter::channel(8);

        let result = Download::new(&fx.store, &fx.manifest, &events)
            .run("a.bin", &out_dir, &OperationId::new())
            .await;

        assert!(matches!(result, Err(VaultError::NotFound(_))));
        assert!(!out_dir.join("a.bin").exists());
        assert!(fx.store.fetched().is_empty());
    }

    #[tokio::test]
    async fn missing_chunk_aborts_and_leaves_partial_output() {
        let fx = fixture();
        let entry = upload(&fx, "a.bin", &pattern(30), 10).await;
        fx.store.remove_blob(&entry.channel_id, &entry.message_ids[1]);
        let out_dir = fx.dir.path().join("downloads");
        let (events, mut rx) = EventReporter::channel(8);

        let result = Download::new(&fx.store, &fx.manifest, &events)
            .run("a.bin", &out_dir, &OperationId::new())
            .await;

        assert!(matches!(result, Err(VaultError::NotFound(_))));
        assert_eq!(fx.store.fetched().len(), 2);
        let partial = std::fs::read(out_dir.join("a.bin")).unwrap();
        assert_eq!(partial, pattern(30)[..10].to_vec());

        let events = drain(&mut rx);
        assert_eq!(progress_values(&events).len(), 1);
        assert_eq!(events.last().unwrap().channel(), "download-error");
    }

    #[tokio::test]
    async fn entry_without_handles_is_not_found() {
        let fx = fixture();
        fx.manifest
            .upsert(ManifestEntry {
                file_name: "broken.bin".into(),
                file_size: 100,
                status: FileStatus::Uploaded,
                channel_id: String::new(),
                message_ids: Vec::new(),
            })
            .await
            .unwrap();
        let (events, _rx) = EventReporter::channel(8);

        let result = Download::new(&fx.store, &fx.manifest, &events)
            .run("broken.bin", fx.dir.path(), &OperationId::new())
            .await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn traversal_in_manifest_name_is_rejected() {
        let fx = fixture();
        fx.manifest
            .upsert(ManifestEntry {
                file_name: "../escape.bin".into(),
                file_size: 1,
                status: FileStatus::Uploaded,
                channel_id: "chan-1".into(),
                message_ids: vec!["msg-1".into()],
            })
            .await
            .unwrap();
        let (events, _rx) = EventReporter::channel(8);

        let result = Download::new(&fx.store, &fx.manifest, &events)
            .run("../escape.bin", &fx.dir.path().join("out"), &OperationId::new())
            .await;
        assert!(matches!(result, Err(VaultError::InvalidRequest(_))));
        assert!(!fx.dir.path().join("escape.bin").exists());
    }
}
