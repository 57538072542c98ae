//! # Leases
//!
//! Resource naming shared by every `LeaseProvider`, plus an in-process
//! provider for single-process deployments and tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, Result};
use crate::models::ThreadId;
use crate::traits::{Lease, LeaseProvider};

/// Resource guarding the id counter.
pub const COUNTER_RESOURCE: &str = "counter";

/// Resource guarding writes of one thread record.
pub fn record_resource(id: ThreadId) -> String {
    format!("thread_{id}")
}

/// Resource guarding a whole load→append→save cycle on one thread.
/// Distinct from `record_resource` so the cycle can call `save` while held.
pub fn append_resource(id: ThreadId) -> String {
    format!("thread_{id}.append")
}

/// In-memory lease table keyed by resource name.
///
/// Only excludes callers inside the current process. Slots are created on
/// first use and kept for the life of the provider.
pub struct MemoryLeaseProvider {
    slots: DashMap<String, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl MemoryLeaseProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            timeout,
        }
    }
}

pub struct MemoryLease {
    resource: String,
    _guard: OwnedMutexGuard<()>,
}

impl Lease for MemoryLease {
    fn resource(&self) -> &str {
        &self.resource
    }
}

#[async_trait]
impl LeaseProvider for MemoryLeaseProvider {
    async fn acquire(&self, resource: &str) -> Result<Box<dyn Lease>> {
        // Clone the slot out so the map shard is not held while waiting.
        let slot = self
            .slots
            .entry(resource.to_string())
            .or_default()
            .clone();

        let guard = tokio::time::timeout(self.timeout, slot.lock_owned())
            .await
            .map_err(|_| AppError::LeaseTimeout(resource.to_string()))?;

        Ok(Box::new(MemoryLease {
            resource: resource.to_string(),
            _guard: guard,
        }))
    }
}
