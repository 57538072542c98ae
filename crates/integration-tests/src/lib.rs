//! Shared fixtures for the Flatboard integration tests: a forum over a
//! throwaway data directory, driven by a clock the test controls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use fb_core::models::Origin;
use fb_core::service::ForumService;
use fb_core::submission::{ReplyDraft, SubmissionPipeline, ThreadDraft};
use fb_core::traits::Clock;
use fb_storage_flatfile::FlatFileBackend;
use tempfile::TempDir;

pub const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// A clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn at(secs: i64) -> Self {
        Self(Mutex::new(timestamp(secs)))
    }

    pub fn set(&self, secs: i64) {
        *self.0.lock().unwrap() = timestamp(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub struct Harness {
    pub dir: TempDir,
    pub backend: FlatFileBackend,
    pub clock: Arc<ManualClock>,
    pub forum: Arc<ForumService>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let backend = FlatFileBackend::open(dir.path(), LOCK_TIMEOUT).unwrap();
        let clock = Arc::new(ManualClock::at(1_700_000_000));
        let forum = Arc::new(backend.forum_service().with_clock(clock.clone()));
        Self {
            dir,
            backend,
            clock,
            forum,
        }
    }

    /// A second, independent backend over the same directory, as another
    /// worker process would open it.
    pub fn second_worker(&self) -> ForumService {
        FlatFileBackend::open(self.dir.path(), LOCK_TIMEOUT)
            .unwrap()
            .forum_service()
            .with_clock(self.clock.clone())
    }

    pub fn thread_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.backend.layout.threads_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn thread_draft(title: &str, author: &str, body: &str) -> ThreadDraft {
    SubmissionPipeline::default()
        .thread(title, author, body)
        .unwrap()
}

pub fn reply_draft(author: &str, body: &str) -> ReplyDraft {
    SubmissionPipeline::default().reply(author, body).unwrap()
}

pub fn origin() -> Origin {
    SubmissionPipeline::default().origin(Some("198.51.100.4"), Some("integration-tests"))
}
