//! # Forum Service
//!
//! The collaborator interface the presentation layer talks to. It sequences
//! the allocator, the record store and the index; it holds no state of its
//! own between calls.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::lease::append_resource;
use crate::models::{Origin, Thread, ThreadId, ThreadSummary};
use crate::submission::{ReplyDraft, ThreadDraft};
use crate::traits::{Clock, LeaseProvider, RecordStore, SequenceAllocator, SystemClock, ThreadIndex};

pub struct ForumService {
    allocator: Arc<dyn SequenceAllocator>,
    store: Arc<dyn RecordStore>,
    index: Arc<dyn ThreadIndex>,
    leases: Arc<dyn LeaseProvider>,
    clock: Arc<dyn Clock>,
}

impl ForumService {
    pub fn new(
        allocator: Arc<dyn SequenceAllocator>,
        store: Arc<dyn RecordStore>,
        index: Arc<dyn ThreadIndex>,
        leases: Arc<dyn LeaseProvider>,
    ) -> Self {
        Self {
            allocator,
            store,
            index,
            leases,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allocates an id and persists a new thread under it.
    ///
    /// If the save fails after allocation the id is simply skipped; ids are
    /// never handed out twice.
    pub async fn create_thread(&self, draft: ThreadDraft, origin: Origin) -> Result<ThreadId> {
        let id = self.allocator.allocate().await?;
        let thread = Thread::new(id, draft, origin, self.clock.now());
        self.store.save(&thread).await?;

        info!(thread_id = %id, "thread created");
        Ok(id)
    }

    /// Appends a reply to thread `id` and returns the new `rid`.
    ///
    /// # Developer Note
    /// The load→append→save cycle runs under a lease scoped to this thread,
    /// so two concurrent replies cannot overwrite each other. `RecordStore::save`
    /// alone does not give that guarantee.
    pub async fn append_reply(&self, id: &str, draft: ReplyDraft, origin: Origin) -> Result<u32> {
        let thread_id = ThreadId::parse(id)
            .filter(|id| id.is_assigned())
            .ok_or_else(|| AppError::thread_not_found(id))?;

        let _lease = self.leases.acquire(&append_resource(thread_id)).await?;

        let mut thread = self
            .store
            .load(&thread_id.to_string())
            .await?
            .ok_or_else(|| AppError::thread_not_found(thread_id.to_string()))?;

        let rid = thread.append_reply(draft, origin, self.clock.now());
        self.store.save(&thread).await?;

        debug!(thread_id = %thread_id, rid, "reply appended");
        Ok(rid)
    }

    pub async fn get_thread(&self, id: &str) -> Result<Option<Thread>> {
        self.store.load(id).await
    }

    /// Every thread, most recently active first. Callers apply their own
    /// page-size cutoff.
    pub async fn list_threads(&self) -> Result<Vec<ThreadSummary>> {
        self.index.list_all().await
    }
}
