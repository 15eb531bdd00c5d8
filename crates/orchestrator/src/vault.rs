//! Entry point tying the store, manifest and event channel together.
//!
//! `Vault` replaces process-wide session and window globals: everything an
//! operation needs is owned here and passed down explicitly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chunkvault_manifest::Manifest;
use chunkvault_protocol::{ManifestEntry, OperationId, TransferEvent};
use chunkvault_transfer::DEFAULT_CHUNK_SIZE;
use tokio::sync::mpsc;

use crate::download::Download;
use crate::error::VaultError;
use crate::events::{EVENT_CHANNEL_CAPACITY, EventReporter};
use crate::store::AttachmentStore;
use crate::upload::Upload;

/// Tunables for a [`Vault`].
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Chunk size in bytes for new uploads.
    pub chunk_size: usize,
    /// Directory downloads are written into.
    pub download_dir: PathBuf,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

/// Stores and retrieves files through an [`AttachmentStore`].
///
/// Each call runs as its own operation with a fresh [`OperationId`].
/// Different files may transfer concurrently; chunks within one file never
/// do.
pub struct Vault {
    store: Arc<dyn AttachmentStore>,
    manifest: Manifest,
    settings: VaultSettings,
    events: EventReporter,
    events_rx: Option<mpsc::Receiver<TransferEvent>>,
}

impl Vault {
    pub fn new(store: Arc<dyn AttachmentStore>, manifest: Manifest, settings: VaultSettings) -> Self {
        let (events, events_rx) = EventReporter::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            manifest,
            settings,
            events,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransferEvent>> {
        self.events_rx.take()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Uploads the file at `path` under a new operation id.
    pub async fn upload(&self, path: &Path) -> Result<ManifestEntry, VaultError> {
        self.upload_as(path, &OperationId::new()).await
    }

    /// Uploads the file at `path`, tagging events with `operation_id`.
    pub async fn upload_as(
        &self,
        path: &Path,
        operation_id: &OperationId,
    ) -> Result<ManifestEntry, VaultError> {
        Upload::new(
            self.store.as_ref(),
            &self.manifest,
            &self.events,
            self.settings.chunk_size,
        )
        .run(path, operation_id)
        .await
    }

    /// Downloads `file_name` into the configured download directory.
    pub async fn download(&self, file_name: &str) -> Result<PathBuf, VaultError> {
        self.download_to(file_name, &self.settings.download_dir, &OperationId::new())
            .await
    }

    /// Downloads `file_name` into `output_dir`, tagging events with
    /// `operation_id`.
    pub async fn download_to(
        &self,
        file_name: &str,
        output_dir: &Path,
        operation_id: &OperationId,
    ) -> Result<PathBuf, VaultError> {
        Download::new(self.store.as_ref(), &self.manifest, &self.events)
            .run(file_name, output_dir, operation_id)
            .await
    }

    /// All stored files, in manifest order.
    pub async fn uploads(&self) -> Vec<ManifestEntry> {
        self.manifest.load().await
    }

    /// Total bytes stored across all files.
    pub async fn usage(&self) -> u64 {
        self.manifest.total_bytes().await
    }
}
