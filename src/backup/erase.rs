use serde::Serialize;

use super::{BackupError, BackupService, CollectionCounts};
use crate::models::Collection;
use crate::store::DocumentStore;

/// Records deleted by [`BackupService::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub counts: CollectionCounts,
    pub settings: usize,
}

impl ClearReport {
    fn record_delete(&mut self, collection: Collection) {
        match collection {
            Collection::Settings => self.settings += 1,
            bulk => self.counts.add(bulk, 1),
        }
    }
}

impl<S: DocumentStore> BackupService<S> {
    /// Deletes every record of every managed collection, one collection at
    /// a time. The first read or delete failure stops the run; records
    /// already deleted stay deleted.
    pub async fn clear(&self) -> Result<ClearReport, BackupError> {
        tracing::info!(backend = self.store.backend_name(), "Clearing all collections");

        let mut report = ClearReport::default();
        for collection in Collection::ALL {
            let rows = self
                .store
                .list_all(collection)
                .await
                .map_err(|source| BackupError::StoreRead { collection, source })?;

            for (key, _) in rows {
                if let Err(source) = self.store.delete(collection, &key).await {
                    return Err(BackupError::StoreDelete {
                        collection,
                        key,
                        source,
                    });
                }
                tracing::debug!("Deleted {}/{}", collection, key);
                report.record_delete(collection);
            }
        }

        tracing::info!(
            students = report.counts.students,
            invoices = report.counts.invoices,
            attendance = report.counts.attendance,
            settings = report.settings,
            "Clear complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, SETTINGS_KEY};
    use crate::store::testing::FaultyStore;
    use crate::store::MemoryStore;

    async fn populated_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(
                Collection::Students,
                vec![
                    ("s1".to_string(), Record::new().with_field("name", "Ann")),
                    ("s2".to_string(), Record::new().with_field("name", "Bo")),
                ],
            )
            .await;
        store
            .seed(
                Collection::Invoices,
                vec![
                    ("i1".to_string(), Record::new().with_field("amount", 10)),
                    ("i2".to_string(), Record::new().with_field("amount", 20)),
                    ("i3".to_string(), Record::new().with_field("amount", 30)),
                ],
            )
            .await;
        store
            .seed(
                Collection::Settings,
                vec![(
                    SETTINGS_KEY.to_string(),
                    Record::new().with_field("businessName", "Studio"),
                )],
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let service = BackupService::new(populated_store().await);

        let report = service.clear().await.unwrap();

        assert_eq!(report.counts.students, 2);
        assert_eq!(report.counts.invoices, 3);
        assert_eq!(report.counts.attendance, 0);
        assert_eq!(report.settings, 1);
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_empty_store_stays_empty() {
        let service = BackupService::new(MemoryStore::new());

        let report = service.clear().await.unwrap();

        assert_eq!(report, ClearReport::default());
        assert!(service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_stops_at_first_failed_delete() {
        let mut store = FaultyStore::new(populated_store().await);
        // Deletes 1-2 are students; #4 is the second invoice.
        store.fail_delete_at = Some(4);
        let service = BackupService::new(store);

        let err = service.clear().await.unwrap_err();

        assert_eq!(err.kind(), "StoreDeleteError");
        assert!(matches!(
            &err,
            BackupError::StoreDelete { collection: Collection::Invoices, key, .. } if key == "i2"
        ));
        let inner = &service.store().inner;
        assert_eq!(inner.len(Collection::Students).await, 0);
        assert_eq!(inner.len(Collection::Invoices).await, 2);
        assert_eq!(inner.len(Collection::Settings).await, 1);
    }

    #[tokio::test]
    async fn test_clear_read_failure_keeps_earlier_deletes() {
        let mut store = FaultyStore::new(populated_store().await);
        store.fail_read_of = Some(Collection::Invoices);
        let service = BackupService::new(store);

        let err = service.clear().await.unwrap_err();

        assert_eq!(err.kind(), "StoreReadError");
        let inner = &service.store().inner;
        assert_eq!(inner.len(Collection::Students).await, 0);
        assert_eq!(inner.len(Collection::Invoices).await, 3);
    }
}
