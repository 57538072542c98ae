//! On-disk layout of a Flatboard data directory.
//!
//! ```text
//! <root>/counter.txt                 last issued thread id
//! <root>/threads/thread_NNNNNNNN.json one document per thread
//! <root>/locks/<resource>.lock       lease files, never data
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fb_core::error::{AppError, Result};
use fb_core::models::ThreadId;
use tracing::info;

const RECORD_PREFIX: &str = "thread_";
const RECORD_SUFFIX: &str = ".json";

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn threads_dir(&self) -> PathBuf {
        self.root.join("threads")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    pub fn counter_path(&self) -> PathBuf {
        self.root.join("counter.txt")
    }

    pub fn thread_path(&self, id: ThreadId) -> PathBuf {
        self.threads_dir()
            .join(format!("{RECORD_PREFIX}{id}{RECORD_SUFFIX}"))
    }

    pub fn lock_path(&self, resource: &str) -> PathBuf {
        self.locks_dir().join(format!("{resource}.lock"))
    }

    /// Creates the directory tree and the counter, then proves the record
    /// directory is writable.
    ///
    /// # Developer Note
    /// Any failure here is `StorageUnavailable`; the binary refuses to start
    /// rather than serve requests that can never be persisted.
    pub fn prepare(&self) -> Result<()> {
        for dir in [self.threads_dir(), self.locks_dir()] {
            fs::create_dir_all(&dir).map_err(|e| unavailable(&dir, e))?;
        }

        let threads = self.threads_dir();
        tempfile::NamedTempFile::new_in(&threads).map_err(|e| unavailable(&threads, e))?;

        // `create_new` so a second worker starting concurrently can never
        // reset a counter that has already issued ids.
        let counter = self.counter_path();
        match OpenOptions::new().write(true).create_new(true).open(&counter) {
            Ok(mut file) => {
                file.write_all(b"0")
                    .and_then(|_| file.sync_all())
                    .map_err(|e| unavailable(&counter, e))?;
                info!(path = %counter.display(), "initialized thread counter");
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(unavailable(&counter, e)),
        }

        Ok(())
    }
}

/// Maps a directory entry name back to the id it stores, if it is a record.
pub(crate) fn record_id_from_file_name(name: &str) -> Option<ThreadId> {
    let digits = name
        .strip_prefix(RECORD_PREFIX)?
        .strip_suffix(RECORD_SUFFIX)?;
    ThreadId::parse(digits).filter(|id| id.is_assigned())
}

/// Replaces `path` with `data` via a temp file in the same directory and a
/// rename, so readers observe either the old or the new content in full.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn unavailable(path: &Path, err: io::Error) -> AppError {
    AppError::StorageUnavailable(format!("{}: {err}", path.display()))
}
