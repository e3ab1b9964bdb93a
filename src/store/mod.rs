//! Document store contract consumed by the backup subsystem.
//!
//! The backup code never talks to a concrete backend. Anything that can list
//! a collection, merge-write one record and delete one record can be backed
//! up, restored and cleared:
//! - [`MemoryStore`]: in-process store, used by the tests
//! - [`crate::db::SqliteDocumentStore`]: the local SQLite-backed store

mod memory;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Collection, Record};

pub use memory::MemoryStore;

/// Errors surfaced by a document store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite / sqlx failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A listed record has an empty key, so it cannot be addressed again.
    #[error("Record stored under an empty key")]
    EmptyKey,

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Generic read/write/delete contract over keyed, schemaless records.
///
/// Every call is a suspension point. Implementations own their own timeout
/// and retry policy; callers attempt each operation exactly once.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every record in the collection as `(key, record)` pairs.
    async fn list_all(&self, collection: Collection) -> StoreResult<Vec<(String, Record)>>;

    /// Writes one record under `key`.
    ///
    /// With `merge = true` only the incoming fields are written and other
    /// destination fields survive; with `merge = false` the destination is
    /// replaced. A missing destination is created either way.
    async fn put_merge(
        &self,
        collection: Collection,
        key: &str,
        record: Record,
        merge: bool,
    ) -> StoreResult<()>;

    /// Deletes the record under `key`. Deleting a missing key is not an error.
    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()>;

    /// Fetches a single record.
    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Record>> {
        Ok(self
            .list_all(collection)
            .await?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record))
    }

    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &'static str;
}
