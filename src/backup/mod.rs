//! Backup, restore and reset of the managed collections.
//!
//! A backup is a single JSON artifact holding every record of the
//! `students`, `invoices` and `monthly_attendance` collections plus the
//! business profile from `settings`.
//!
//! # Operations
//!
//! - [`BackupService::export`]: read every collection and build an artifact
//! - [`BackupService::import`]: merge (or replace) artifact records back in
//! - [`BackupService::inspect`]: validate an artifact without store access
//! - [`BackupService::clear`]: delete every record of every managed collection
//!
//! None of these run inside a transaction. A failed import or clear leaves
//! the records it already processed in place; re-running an import is safe
//! because merge writes are idempotent per record.

mod erase;
mod error;
mod export;
mod import;
mod snapshot;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::Collection;
use crate::store::DocumentStore;

pub use erase::ClearReport;
pub use error::{BackupError, OperationError, OperationResult};
pub use export::ExportOutcome;
pub use import::{ImportOptions, ImportReport};
pub use snapshot::{ParsedSnapshot, Snapshot, SnapshotSummary};

/// Format tag written into every artifact.
pub const BACKUP_VERSION: &str = "1.0";

/// Product name used in artifact filenames unless configured otherwise.
pub const DEFAULT_PRODUCT_NAME: &str = "Ledgerly";

/// Per-collection record counts for the three bulk collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub students: usize,
    pub invoices: usize,
    pub attendance: usize,
}

impl CollectionCounts {
    /// Count for a bulk collection; settings are never counted.
    pub fn get(&self, collection: Collection) -> usize {
        match collection {
            Collection::Students => self.students,
            Collection::Invoices => self.invoices,
            Collection::MonthlyAttendance => self.attendance,
            Collection::Settings => 0,
        }
    }

    pub fn add(&mut self, collection: Collection, n: usize) {
        match collection {
            Collection::Students => self.students += n,
            Collection::Invoices => self.invoices += n,
            Collection::MonthlyAttendance => self.attendance += n,
            Collection::Settings => {}
        }
    }

    pub fn total(&self) -> usize {
        self.students + self.invoices + self.attendance
    }
}

impl fmt::Display for CollectionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "students={} invoices={} attendance={}",
            self.students, self.invoices, self.attendance
        )
    }
}

/// A serialized backup plus the filename it should be saved under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupArtifact {
    pub filename: String,
    pub contents: String,
}

impl BackupArtifact {
    /// Saves the artifact as `<dir>/<filename>`, creating `dir` if needed.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, BackupError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| BackupError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let path = dir.join(&self.filename);
        tokio::fs::write(&path, self.contents.as_bytes())
            .await
            .map_err(|source| BackupError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}

/// Deterministic artifact name: `<product>_Backup_<YYYY-MM-DD>.json`.
pub fn backup_filename(product_name: &str, date: NaiveDate) -> String {
    let product: String = product_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();
    let product = if product.is_empty() {
        DEFAULT_PRODUCT_NAME
    } else {
        product.as_str()
    };
    format!("{}_Backup_{}.json", product, date.format("%Y-%m-%d"))
}

/// Runs backup operations against a document store.
pub struct BackupService<S> {
    store: S,
    product_name: String,
}

impl<S: DocumentStore> BackupService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
        }
    }

    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Parses and validates an artifact without touching the store.
    pub fn inspect(&self, artifact: &str) -> Result<SnapshotSummary, BackupError> {
        ParsedSnapshot::parse(artifact).map(|snapshot| snapshot.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    #[test]
    fn test_backup_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            backup_filename("Ledgerly", date),
            "Ledgerly_Backup_2026-03-09.json"
        );
        assert_eq!(
            backup_filename("My Studio", date),
            "My_Studio_Backup_2026-03-09.json"
        );
        assert_eq!(backup_filename("  ", date), "Ledgerly_Backup_2026-03-09.json");
    }

    #[test]
    fn test_counts_ignore_settings() {
        let mut counts = CollectionCounts::default();
        counts.add(Collection::Students, 2);
        counts.add(Collection::MonthlyAttendance, 1);
        counts.add(Collection::Settings, 5);

        assert_eq!(counts.get(Collection::Students), 2);
        assert_eq!(counts.get(Collection::Settings), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.to_string(), "students=2 invoices=0 attendance=1");
    }

    #[tokio::test]
    async fn test_artifact_write_to_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("backups").join("2026");
        let artifact = BackupArtifact {
            filename: "Ledgerly_Backup_2026-03-09.json".to_string(),
            contents: "{}".to_string(),
        };

        let path = artifact.write_to(&dir).await.unwrap();

        assert_eq!(path, dir.join("Ledgerly_Backup_2026-03-09.json"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_inspect_reads_envelope_only() {
        let service = BackupService::new(MemoryStore::new());
        let summary = service
            .inspect(r#"{"exportDate":"2026-03-09T10:00:00.000Z","version":"1.0","invoices":[{"id":"i1"}]}"#)
            .unwrap();
        assert_eq!(summary.counts.invoices, 1);
        assert!(!summary.has_settings);

        let err = service.inspect(r#"{"version":"1.0"}"#).unwrap_err();
        assert_eq!(err.kind(), "FormatError");
    }
}
