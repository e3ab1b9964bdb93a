use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{
    backup_filename, BackupArtifact, BackupError, BackupService, CollectionCounts, Snapshot,
    BACKUP_VERSION,
};
use crate::models::{Collection, KeyedRecord, Record, SETTINGS_KEY};
use crate::store::{DocumentStore, StoreError};

/// Result of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub artifact: BackupArtifact,
    /// Bulk record counts; the settings record is never counted.
    pub counts: CollectionCounts,
    pub has_settings: bool,
}

impl<S: DocumentStore> BackupService<S> {
    /// Snapshots every managed collection into a fresh artifact.
    pub async fn export(&self) -> Result<ExportOutcome, BackupError> {
        self.export_at(Utc::now()).await
    }

    /// Same as [`export`](Self::export) with an explicit creation time.
    ///
    /// A failed read of any bulk collection aborts the export; a failed
    /// settings read only drops the settings from the artifact.
    pub async fn export_at(&self, now: DateTime<Utc>) -> Result<ExportOutcome, BackupError> {
        tracing::info!(backend = self.store.backend_name(), "Starting export");

        let students = self.read_bulk(Collection::Students).await?;
        let invoices = self.read_bulk(Collection::Invoices).await?;
        let attendance = self.read_bulk(Collection::MonthlyAttendance).await?;
        let settings = self.read_settings().await;

        let snapshot = Snapshot {
            export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: BACKUP_VERSION.to_string(),
            students,
            invoices,
            attendance,
            settings,
        };
        let counts = snapshot.counts();
        let has_settings = snapshot.settings.is_some();

        let contents = serde_json::to_string_pretty(&snapshot).map_err(BackupError::Encode)?;
        let artifact = BackupArtifact {
            filename: backup_filename(&self.product_name, now.date_naive()),
            contents,
        };

        tracing::info!(
            students = counts.students,
            invoices = counts.invoices,
            attendance = counts.attendance,
            has_settings,
            "Export complete: {}",
            artifact.filename
        );

        Ok(ExportOutcome {
            artifact,
            counts,
            has_settings,
        })
    }

    async fn read_bulk(&self, collection: Collection) -> Result<Vec<Record>, BackupError> {
        let rows = self
            .store
            .list_all(collection)
            .await
            .map_err(|source| BackupError::StoreRead { collection, source })?;

        tracing::debug!("Read {} record(s) from {}", rows.len(), collection);
        let mut records = Vec::with_capacity(rows.len());
        for (key, record) in rows {
            // An empty `id` would make the whole artifact unimportable.
            if key.is_empty() {
                return Err(BackupError::StoreRead {
                    collection,
                    source: StoreError::EmptyKey,
                });
            }
            records.push(KeyedRecord::new(key, record).into_snapshot());
        }
        Ok(records)
    }

    /// Prefers the record under the fixed settings key, else the first one.
    ///
    /// The source key is not exported; import always writes the profile
    /// under `SETTINGS_KEY`. An empty profile is exported as no settings.
    async fn read_settings(&self) -> Option<Record> {
        match self.store.list_all(Collection::Settings).await {
            Ok(rows) => {
                let mut first = None;
                for (key, record) in rows {
                    if key == SETTINGS_KEY {
                        first = Some(record);
                        break;
                    }
                    if first.is_none() {
                        first = Some(record);
                    }
                }
                first.filter(|record| !record.is_empty())
            }
            Err(e) => {
                tracing::warn!("Settings could not be read, exporting without them: {}", e);
                None
            }
        }
    }
}
