//! OS file locks as `LeaseProvider`.
//!
//! Each resource maps to its own lock file under `locks/`. The lock is an
//! advisory exclusive lock on that file (flock on unix, LockFileEx on
//! windows), so independent processes sharing the data directory exclude
//! each other. Data files are never locked directly because they are
//! replaced by rename.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fb_core::error::{AppError, Result};
use fb_core::traits::{Lease, LeaseProvider};
use fs2::FileExt;
use tracing::warn;

use crate::layout::StorageLayout;

/// Polling interval bounds while a lock is contended.
const MIN_BACKOFF: Duration = Duration::from_millis(2);
const MAX_BACKOFF: Duration = Duration::from_millis(64);

pub struct FileLeaseProvider {
    layout: StorageLayout,
    timeout: Duration,
}

impl FileLeaseProvider {
    pub fn new(layout: StorageLayout, timeout: Duration) -> Self {
        Self { layout, timeout }
    }
}

#[derive(Debug)]
pub struct FileLease {
    resource: String,
    file: File,
}

impl Lease for FileLease {
    fn resource(&self) -> &str {
        &self.resource
    }
}

impl Drop for FileLease {
    fn drop(&mut self) {
        // Closing the handle releases the lock too; unlock explicitly so the
        // release does not depend on when the handle is closed.
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(resource = %self.resource, "failed to release lease: {e}");
        }
    }
}

#[async_trait]
impl LeaseProvider for FileLeaseProvider {
    async fn acquire(&self, resource: &str) -> Result<Box<dyn Lease>> {
        let path = self.layout.lock_path(resource);
        let resource = resource.to_string();
        let timeout = self.timeout;

        let lease = tokio::task::spawn_blocking(move || lock_exclusive(resource, &path, timeout))
            .await
            .map_err(|e| AppError::Storage(format!("lease task failed: {e}")))??;

        Ok(Box::new(lease))
    }
}

/// Polls `try_lock_exclusive` with exponential backoff until the lock is
/// held or `timeout` has elapsed.
fn lock_exclusive(resource: String, path: &Path, timeout: Duration) -> Result<FileLease> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;

    let start = Instant::now();
    let mut backoff = MIN_BACKOFF;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(FileLease { resource, file }),
            Err(e) if is_contended(&e) => {}
            Err(e) => return Err(e.into()),
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(AppError::LeaseTimeout(resource));
        }

        thread::sleep(backoff.min(timeout - elapsed));
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
