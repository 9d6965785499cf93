//! Store wrappers for exercising interleavings in tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::error::Result;
use crate::store::{AccountStore, MemoryAccountStore};
use crate::types::StoredAccount;

/// In-memory store whose next `save` can be held open.
///
/// After [`GatedStore::arm`], the next save signals `entered` and then waits
/// for a permit on `release` before writing.
pub(crate) struct GatedStore {
    inner: MemoryAccountStore,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Semaphore,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryAccountStore::new(),
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStore for GatedStore {
    async fn save(&self, record: &StoredAccount) -> Result<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            let _permit = self.release.acquire().await.expect("gate closed");
        }
        self.inner.save(record).await
    }

    async fn load(&self, id: &str) -> Result<StoredAccount> {
        self.inner.load(id).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.inner.remove(id).await
    }

    async fn list(&self) -> Result<Vec<StoredAccount>> {
        self.inner.list().await
    }
}
