use serde::Serialize;

use super::{BackupError, BackupService, CollectionCounts, ParsedSnapshot, BACKUP_VERSION};
use crate::models::{Collection, SETTINGS_KEY};
use crate::store::DocumentStore;

/// Options for [`BackupService::import`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Replace destination records instead of merging into them.
    pub overwrite: bool,
}

/// Result of a successful import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub counts: CollectionCounts,
    pub settings_restored: bool,
    /// `exportDate` of the artifact that was applied.
    pub export_date: String,
}

impl<S: DocumentStore> BackupService<S> {
    /// Re-applies an artifact to the store.
    ///
    /// Records are written one at a time in artifact order: students, then
    /// invoices, then attendance, then the settings profile. The first failed
    /// write stops the import; everything written before it stays.
    pub async fn import(
        &self,
        artifact: &str,
        options: ImportOptions,
    ) -> Result<ImportReport, BackupError> {
        let snapshot = ParsedSnapshot::parse(artifact)?;
        if !snapshot.is_current_version() {
            tracing::warn!(
                "Backup version {} differs from {}; importing anyway",
                snapshot.version,
                BACKUP_VERSION
            );
        }

        let merge = !options.overwrite;
        tracing::info!(
            backend = self.store.backend_name(),
            overwrite = options.overwrite,
            "Starting import of backup from {}",
            snapshot.export_date
        );

        let ParsedSnapshot {
            export_date,
            bulk,
            settings,
            ..
        } = snapshot;

        let mut counts = CollectionCounts::default();
        for (collection, records) in bulk {
            for keyed in records {
                if let Err(source) = self
                    .store
                    .put_merge(collection, &keyed.id, keyed.record, merge)
                    .await
                {
                    return Err(BackupError::StoreWrite {
                        collection,
                        key: keyed.id,
                        committed: counts,
                        source,
                    });
                }
                tracing::debug!("Wrote {}/{}", collection, keyed.id);
                counts.add(collection, 1);
            }
        }

        let settings_restored = settings.is_some();
        if let Some(profile) = settings {
            if let Err(source) = self
                .store
                .put_merge(Collection::Settings, SETTINGS_KEY, profile, merge)
                .await
            {
                return Err(BackupError::StoreWrite {
                    collection: Collection::Settings,
                    key: SETTINGS_KEY.to_string(),
                    committed: counts,
                    source,
                });
            }
        }

        tracing::info!(
            students = counts.students,
            invoices = counts.invoices,
            attendance = counts.attendance,
            settings_restored,
            "Import complete"
        );

        Ok(ImportReport {
            counts,
            settings_restored,
            export_date,
        })
    }
}
