use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chunkvault_protocol::ManifestEntry;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ManifestError;

/// JSON-backed manifest of stored files.
///
/// Every mutation is a read-modify-write of the whole document. Writers in
/// this process are serialized through an internal lock; separate processes
/// sharing the same file can still lose each other's updates.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Manifest {
    /// Creates a manifest backed by `path` without touching the disk.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens the manifest, creating an empty document if none exists yet.
    pub async fn open(path: PathBuf) -> Result<Self, ManifestError> {
        if tokio::fs::try_exists(&path).await? {
            return Ok(Self::new(path));
        }
        let manifest = Self::new(path);
        manifest.persist(&[]).await?;
        debug!(path = %manifest.path.display(), "created empty manifest");
        Ok(manifest)
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all entries.
    ///
    /// Returns an empty list if the document is absent or cannot be parsed.
    /// Corruption is logged and otherwise ignored; the next upsert then
    /// overwrites the damaged document.
    pub async fn load(&self) -> Vec<ManifestEntry> {
        load_entries(&self.path).await
    }

    /// Returns the entry stored under `file_name`, if any.
    pub async fn get(&self, file_name: &str) -> Option<ManifestEntry> {
        self.load()
            .await
            .into_iter()
            .find(|entry| entry.file_name == file_name)
    }

    /// Inserts `entry`, fully replacing any entry with the same file name,
    /// and writes the whole document back.
    pub async fn upsert(&self, entry: ManifestEntry) -> Result<(), ManifestError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        match entries.iter_mut().find(|e| e.file_name == entry.file_name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }

        self.persist(&entries).await
    }

    /// Sum of `file_size` over all entries.
    pub async fn total_bytes(&self) -> u64 {
        self.load().await.iter().map(|e| e.file_size).sum()
    }

    /// Writes `entries` to disk, replacing the previous document.
    ///
    /// The document is written to a sibling temp file and renamed into
    /// place so a crash mid-write never leaves a truncated manifest.
    async fn persist(&self, entries: &[ManifestEntry]) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            entries = entries.len(),
            path = %self.path.display(),
            "persisted manifest"
        );
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Reads entries from a JSON document on disk.
async fn load_entries(path: &Path) -> Vec<ManifestEntry> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read manifest, treating as empty");
            return Vec::new();
        }
    };

    if data.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<ManifestEntry>>(&data) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "manifest is corrupt, treating as empty");
            Vec::new()
        }
    }
}
