//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};

use crate::error::Result;
use crate::models::{Thread, ThreadId, ThreadSummary};

/// Issues unique, strictly increasing thread identifiers.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Returns the next id. Any failure is an `AllocationFailure`; no id is
    /// handed out unless the new counter value is durable.
    async fn allocate(&self) -> Result<ThreadId>;
}

/// Whole-document persistence of thread records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Resolves `id` (padded or not) to a thread. Malformed ids, missing
    /// records and unparseable documents all yield `Ok(None)`.
    async fn load(&self, id: &str) -> Result<Option<Thread>>;

    /// Replaces the stored document for `thread.id`. Concurrent readers see
    /// either the previous or the new document, never a mix.
    async fn save(&self, thread: &Thread) -> Result<()>;
}

/// Listing of every stored thread.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadIndex: Send + Sync {
    /// All readable threads, most recently active first.
    async fn list_all(&self) -> Result<Vec<ThreadSummary>>;
}

/// A scoped exclusive lease on a named resource. Released on drop.
pub trait Lease: Send {
    fn resource(&self) -> &str;
}

/// Mutual exclusion keyed by resource name.
///
/// # Developer Note
/// Implementations decide the scope of exclusion: OS file locks coordinate
/// independent processes, an in-memory table only coordinates one process.
#[async_trait]
pub trait LeaseProvider: Send + Sync {
    /// Blocks until the lease is held or the provider's wait bound expires
    /// (`AppError::LeaseTimeout`).
    async fn acquire(&self, resource: &str) -> Result<Box<dyn Lease>>;
}

/// Source of timestamps for new threads and replies.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, truncated to whole seconds to match the stored precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}
