//! # Flat-file record store
//!
//! One pretty-printed JSON document per thread. Writes replace the whole
//! document under the record's lease; reads never lock.

use std::cmp::Ordering;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use fb_core::error::{AppError, Result};
use fb_core::lease::record_resource;
use fb_core::models::{Thread, ThreadId, ThreadSummary};
use fb_core::traits::{LeaseProvider, RecordStore, ThreadIndex};
use tracing::{debug, warn};

use crate::layout::{atomic_write, record_id_from_file_name, StorageLayout};

pub struct FlatFileStore {
    layout: StorageLayout,
    leases: Arc<dyn LeaseProvider>,
}

impl FlatFileStore {
    pub fn new(layout: StorageLayout, leases: Arc<dyn LeaseProvider>) -> Self {
        Self { layout, leases }
    }

    /// Reads the raw document for `id`. `Ok(None)` when there is no regular
    /// file under the record name or its bytes are not UTF-8.
    async fn read_record(&self, id: ThreadId) -> Result<Option<String>> {
        let path = self.layout.thread_path(id);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if !meta.is_file() => {
                warn!(thread_id = %id, "record name is taken by a non-file entry");
                return Ok(None);
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(format!("{}: {e}", path.display()))),
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(thread_id = %id, "record is not valid UTF-8");
                Ok(None)
            }
            Err(e) => Err(AppError::Storage(format!("{}: {e}", path.display()))),
        }
    }
}

/// Strict decode: every field must be present and typed, the stored id must
/// match the record's name, and reply numbering must be contiguous.
pub(crate) fn decode(raw: &str, expected: ThreadId) -> std::result::Result<Thread, String> {
    let thread: Thread = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if thread.id != expected {
        return Err(format!("stored id {} does not match record name", thread.id));
    }
    thread.check_integrity()?;
    Ok(thread)
}

/// Most recent activity first; ties fall back to the higher id.
pub(crate) fn by_recency(a: &ThreadSummary, b: &ThreadSummary) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl RecordStore for FlatFileStore {
    async fn load(&self, id: &str) -> Result<Option<Thread>> {
        let Some(id) = ThreadId::parse(id).filter(|id| id.is_assigned()) else {
            return Ok(None);
        };

        let Some(raw) = self.read_record(id).await? else {
            return Ok(None);
        };

        match decode(&raw, id) {
            Ok(thread) => Ok(Some(thread)),
            Err(reason) => {
                warn!(thread_id = %id, %reason, "malformed record treated as missing");
                Ok(None)
            }
        }
    }

    async fn save(&self, thread: &Thread) -> Result<()> {
        if !thread.id.is_assigned() {
            return Err(AppError::InvalidRecord("thread id is not set".into()));
        }

        let json = serde_json::to_string_pretty(thread)
            .map_err(|e| AppError::Storage(format!("failed to encode thread {}: {e}", thread.id)))?;

        let _lease = self.leases.acquire(&record_resource(thread.id)).await?;

        let path = self.layout.thread_path(thread.id);
        tokio::task::spawn_blocking(move || atomic_write(&path, json.as_bytes()))
            .await
            .map_err(|e| AppError::Storage(format!("write task failed: {e}")))??;

        debug!(thread_id = %thread.id, replies = thread.replies.len(), "record saved");
        Ok(())
    }
}

#[async_trait]
impl ThreadIndex for FlatFileStore {
    async fn list_all(&self) -> Result<Vec<ThreadSummary>> {
        let dir = self.layout.threads_dir();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {e}", dir.display())))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(record_id_from_file_name) else {
                continue;
            };

            // Files can vanish between listing and reading; that is not an error.
            // An unreadable entry is skipped so it cannot hide the others.
            let raw = match self.read_record(id).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(thread_id = %id, "skipping unreadable record: {e}");
                    continue;
                }
            };

            match decode(&raw, id) {
                Ok(thread) if thread.title.trim().is_empty() => {
                    warn!(thread_id = %id, "skipping record without title");
                }
                Ok(thread) => summaries.push(thread.summary()),
                Err(reason) => {
                    warn!(thread_id = %id, %reason, "skipping malformed record");
                }
            }
        }

        summaries.sort_by(by_recency);
        Ok(summaries)
    }
}
