//! Fault-injecting store double for partial-failure tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{DocumentStore, MemoryStore, StoreError, StoreResult};
use crate::models::{Collection, Record};

/// Wraps a [`MemoryStore`] and fails selected calls.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    /// 1-based index of the `put_merge` call that fails.
    pub fail_write_at: Option<usize>,
    /// 1-based index of the `delete` call that fails.
    pub fail_delete_at: Option<usize>,
    /// Collection whose `list_all` fails.
    pub fail_read_of: Option<Collection>,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    attempted: Mutex<Vec<(Collection, String)>>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Every `put_merge` target in call order, failed attempt included.
    pub fn attempted_writes(&self) -> Vec<(Collection, String)> {
        self.attempted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn list_all(&self, collection: Collection) -> StoreResult<Vec<(String, Record)>> {
        if self.fail_read_of == Some(collection) {
            return Err(StoreError::Backend(format!("read of {} refused", collection)));
        }
        self.inner.list_all(collection).await
    }

    async fn put_merge(
        &self,
        collection: Collection,
        key: &str,
        record: Record,
        merge: bool,
    ) -> StoreResult<()> {
        self.attempted
            .lock()
            .unwrap()
            .push((collection, key.to_string()));
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_write_at == Some(n) {
            return Err(StoreError::Backend(format!("write #{} refused", n)));
        }
        self.inner.put_merge(collection, key, record, merge).await
    }

    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()> {
        let n = self.deletes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_delete_at == Some(n) {
            return Err(StoreError::Backend(format!("delete #{} refused", n)));
        }
        self.inner.delete(collection, key).await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}
