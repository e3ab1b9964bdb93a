use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{Collection, Record};
use crate::store::{DocumentStore, StoreResult};

/// SQLite-backed document store.
///
/// Each record is one row of the `documents` table; the body column holds
/// the record's fields as JSON text.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    key: String,
    body: String,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_all(&self, collection: Collection) -> StoreResult<Vec<(String, Record)>> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT key, body FROM documents WHERE collection = ? ORDER BY key")
                .bind(collection.name())
                .fetch_all(&self.pool)
                .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record: Record = serde_json::from_str(&row.body)?;
            records.push((row.key, record));
        }
        Ok(records)
    }

    async fn put_merge(
        &self,
        collection: Collection,
        key: &str,
        record: Record,
        merge: bool,
    ) -> StoreResult<()> {
        // Read and write in one transaction so a single record lands whole.
        let mut tx = self.pool.begin().await?;

        let body = if merge {
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND key = ?")
                    .bind(collection.name())
                    .bind(key)
                    .fetch_optional(&mut *tx)
                    .await?;
            match existing {
                Some((body,)) => {
                    let mut current: Record = serde_json::from_str(&body)?;
                    current.merge_from(record);
                    current
                }
                None => record,
            }
        } else {
            record
        };

        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, key)
            DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection.name())
        .bind(key)
        .bind(serde_json::to_string(&body)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND key = ?")
            .bind(collection.name())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Record>> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT key, body FROM documents WHERE collection = ? AND key = ?")
                .bind(collection.name())
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_str(&row.body)?)),
            None => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
