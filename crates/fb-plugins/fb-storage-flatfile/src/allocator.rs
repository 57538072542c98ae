//! Counter-file `SequenceAllocator`.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fb_core::error::{AppError, Result};
use fb_core::lease::COUNTER_RESOURCE;
use fb_core::models::ThreadId;
use fb_core::traits::{LeaseProvider, SequenceAllocator};
use tracing::debug;

use crate::layout::{atomic_write, StorageLayout};

/// Issues thread ids from `counter.txt`.
///
/// The read→increment→write runs under the `counter` lease and the new value
/// is durable before the id is returned. A crash after the write but before
/// the record is saved leaves a gap; an id is never issued twice.
pub struct CounterFileAllocator {
    layout: StorageLayout,
    leases: Arc<dyn LeaseProvider>,
}

impl CounterFileAllocator {
    pub fn new(layout: StorageLayout, leases: Arc<dyn LeaseProvider>) -> Self {
        Self { layout, leases }
    }
}

#[async_trait]
impl SequenceAllocator for CounterFileAllocator {
    async fn allocate(&self) -> Result<ThreadId> {
        let _lease = self
            .leases
            .acquire(COUNTER_RESOURCE)
            .await
            .map_err(|e| AppError::AllocationFailure(e.to_string()))?;

        let path = self.layout.counter_path();
        let id = tokio::task::spawn_blocking(move || increment(&path))
            .await
            .map_err(|e| AppError::AllocationFailure(format!("counter task failed: {e}")))??;

        debug!(thread_id = %id, "allocated thread id");
        Ok(id)
    }
}

fn increment(path: &Path) -> Result<ThreadId> {
    let current = match fs::read_to_string(path) {
        Ok(raw) => parse_counter(&raw)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
        Err(e) => return Err(failure(path, e)),
    };

    let next = current
        .checked_add(1)
        .ok_or_else(|| AppError::AllocationFailure("thread counter exhausted".into()))?;

    atomic_write(path, next.to_string().as_bytes()).map_err(|e| failure(path, e))?;
    Ok(ThreadId::new(next))
}

/// An empty counter counts as 0. Anything else that is not a plain decimal
/// integer is refused rather than reset, since resetting would reissue ids.
fn parse_counter(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<u64>().map_err(|_| {
        AppError::AllocationFailure(format!("counter holds a non-numeric value {trimmed:?}"))
    })
}

fn failure(path: &Path, err: io::Error) -> AppError {
    AppError::AllocationFailure(format!("{}: {err}", path.display()))
}
