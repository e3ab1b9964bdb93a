//! In-process document store backed by ordered maps.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{DocumentStore, StoreResult};
use crate::models::{Collection, Record};

/// In-memory document store.
///
/// Records are kept per collection in key order, so `list_all` is
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection, replacing any record already stored under the same key.
    pub async fn seed(
        &self,
        collection: Collection,
        records: impl IntoIterator<Item = (String, Record)>,
    ) {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection).or_default();
        for (key, record) in records {
            entries.insert(key, record);
        }
    }

    /// Number of records currently in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    /// True when every collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.collections
            .read()
            .await
            .values()
            .all(BTreeMap::is_empty)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, collection: Collection) -> StoreResult<Vec<(String, Record)>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(key, record)| (key.clone(), record.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_merge(
        &self,
        collection: Collection,
        key: &str,
        record: Record,
        merge: bool,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection).or_default();
        if merge {
            if let Some(existing) = entries.get_mut(key) {
                existing.merge_from(record);
                return Ok(());
            }
        }
        entries.insert(key.to_string(), record);
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(entries) = collections.get_mut(&collection) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Record>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
