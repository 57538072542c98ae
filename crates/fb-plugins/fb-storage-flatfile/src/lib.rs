//! # fb-storage-flatfile
//! flatboard/crates/fb-plugins/fb-storage-flatfile/src/lib.rs
//! Flat-file implementation of the fb-core storage ports.
//! Features: counter-file id allocation, one JSON document per thread,
//! OS file leases and atomic rename-on-write.

pub mod allocator;
pub mod layout;
pub mod lease;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fb_core::error::Result;
use fb_core::service::ForumService;
use fb_core::traits::LeaseProvider;
use tracing::info;

pub use allocator::CounterFileAllocator;
pub use layout::StorageLayout;
pub use lease::{FileLease, FileLeaseProvider};
pub use store::FlatFileStore;

/// The flat-file ports wired together over one data directory.
pub struct FlatFileBackend {
    pub layout: StorageLayout,
    pub leases: Arc<dyn LeaseProvider>,
    pub allocator: Arc<CounterFileAllocator>,
    pub store: Arc<FlatFileStore>,
}

impl FlatFileBackend {
    /// Prepares `root` (see `StorageLayout::prepare`) and builds the ports
    /// on top of file leases.
    pub fn open(root: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self> {
        let layout = StorageLayout::new(root);
        let leases: Arc<dyn LeaseProvider> =
            Arc::new(FileLeaseProvider::new(layout.clone(), lock_timeout));
        Self::with_leases(layout, leases)
    }

    /// Same as `open` but with a caller-chosen lease provider.
    pub fn with_leases(layout: StorageLayout, leases: Arc<dyn LeaseProvider>) -> Result<Self> {
        layout.prepare()?;
        info!(root = %layout.root().display(), "flat-file storage ready");

        Ok(Self {
            allocator: Arc::new(CounterFileAllocator::new(layout.clone(), leases.clone())),
            store: Arc::new(FlatFileStore::new(layout.clone(), leases.clone())),
            layout,
            leases,
        })
    }

    pub fn forum_service(&self) -> ForumService {
        ForumService::new(
            self.allocator.clone(),
            self.store.clone(),
            self.store.clone(),
            self.leases.clone(),
        )
    }
}
