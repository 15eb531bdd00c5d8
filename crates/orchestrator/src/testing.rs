//! In-memory attachment store shared by the orchestrator tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chunkvault_protocol::TransferEvent;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::store::{AttachmentStore, StoreFuture};

/// Mock store that keeps blobs in memory and records every call.
#[derive(Default)]
pub(crate) struct MockStore {
    /// Container name -> container id.
    containers: Mutex<HashMap<String, String>>,
    /// (container id, blob id) -> bytes.
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub(crate) sends: Mutex<Vec<(String, String, usize)>>,
    pub(crate) fetches: Mutex<Vec<String>>,
    pub(crate) created: Mutex<Vec<String>>,
    /// One-based send number that fails with `TransferFailed`.
    fail_send_at: Option<usize>,
    next_id: Mutex<u64>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_send_at(n: usize) -> Self {
        Self {
            fail_send_at: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub(crate) fn sent_labels(&self) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(_, label, _)| label.clone())
            .collect()
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub(crate) fn remove_container(&self, id: &str) {
        self.containers.lock().unwrap().retain(|_, v| v != id);
    }

    pub(crate) fn remove_blob(&self, container: &str, blob: &str) {
        self.blobs
            .lock()
            .unwrap()
            .remove(&(container.to_string(), blob.to_string()));
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{prefix}-{next}")
    }
}

impl AttachmentStore for MockStore {
    fn ensure_container<'a>(&'a self, name: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            if let Some(id) = self.containers.lock().unwrap().get(name) {
                return Ok(id.clone());
            }
            let id = self.next_id("chan");
            self.containers
                .lock()
                .unwrap()
                .insert(name.to_string(), id.clone());
            self.created.lock().unwrap().push(name.to_string());
            Ok(id)
        })
    }

    fn container_exists<'a>(&'a self, container: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            Ok(self
                .containers
                .lock()
                .unwrap()
                .values()
                .any(|id| id == container))
        })
    }

    fn send_blob<'a>(
        &'a self,
        container: &'a str,
        label: &'a str,
        data: Vec<u8>,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let attempt = {
                let mut sends = self.sends.lock().unwrap();
                sends.push((container.to_string(), label.to_string(), data.len()));
                sends.len()
            };
            if self.fail_send_at == Some(attempt) {
                return Err(StoreError::TransferFailed(format!(
                    "simulated failure sending {label}"
                )));
            }
            let id = self.next_id("msg");
            self.blobs
                .lock()
                .unwrap()
                .insert((container.to_string(), id.clone()), data);
            Ok(id)
        })
    }

    fn fetch_blob<'a>(&'a self, container: &'a str, blob: &'a str) -> StoreFuture<'a, Vec<u8>> {
        Box::pin(async move {
            self.fetches.lock().unwrap().push(blob.to_string());
            self.blobs
                .lock()
                .unwrap()
                .get(&(container.to_string(), blob.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("message {blob} not found")))
        })
    }
}

/// Drains every event currently buffered in `rx`.
pub(crate) fn drain(rx: &mut mpsc::Receiver<TransferEvent>) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Percent values of all progress events, in emission order.
pub(crate) fn progress_values(events: &[TransferEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            TransferEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Deterministic, non-repeating-looking test payload.
pub(crate) fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 ^ (i / 251) as u8).collect()
}
