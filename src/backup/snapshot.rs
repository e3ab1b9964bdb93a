//! Backup artifact envelope: serialization on export, parsing and
//! validation on import.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BackupError, CollectionCounts, BACKUP_VERSION};
use crate::models::{Collection, KeyedRecord, Record};

/// The serialized shape of a backup.
///
/// Bulk records carry their key inlined as `id`; `settings` is `null` when
/// the store had no business profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub export_date: String,
    pub version: String,
    pub students: Vec<Record>,
    pub invoices: Vec<Record>,
    pub attendance: Vec<Record>,
    pub settings: Option<Record>,
}

impl Snapshot {
    pub fn counts(&self) -> CollectionCounts {
        CollectionCounts {
            students: self.students.len(),
            invoices: self.invoices.len(),
            attendance: self.attendance.len(),
        }
    }
}

/// Loose mirror of [`Snapshot`] used for parsing, so missing fields turn
/// into precise format errors instead of serde messages.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    export_date: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    students: Option<Vec<Value>>,
    #[serde(default)]
    invoices: Option<Vec<Value>>,
    #[serde(default)]
    attendance: Option<Vec<Value>>,
    #[serde(default)]
    settings: Option<Value>,
}

/// A validated artifact, ready to be re-applied to a store.
#[derive(Debug, Clone)]
pub struct ParsedSnapshot {
    pub export_date: String,
    pub version: String,
    /// Bulk records per collection, in import order.
    pub bulk: Vec<(Collection, Vec<KeyedRecord>)>,
    pub settings: Option<Record>,
}

impl ParsedSnapshot {
    /// Parses and validates an artifact.
    ///
    /// Every record is checked here, so a malformed artifact is rejected
    /// before the first write.
    pub fn parse(artifact: &str) -> Result<Self, BackupError> {
        let document: Value = serde_json::from_str(artifact)
            .map_err(|e| BackupError::format(format!("not valid JSON: {}", e)))?;
        if !document.is_object() {
            return Err(BackupError::format("top level must be a JSON object"));
        }
        let raw: RawSnapshot = serde_json::from_value(document)
            .map_err(|e| BackupError::format(e.to_string()))?;

        let version = required_string(raw.version, "version")?;
        let export_date = required_string(raw.export_date, "exportDate")?;

        let mut bulk = Vec::with_capacity(Collection::BULK.len());
        for (collection, values) in [
            (Collection::Students, raw.students),
            (Collection::Invoices, raw.invoices),
            (Collection::MonthlyAttendance, raw.attendance),
        ] {
            bulk.push((collection, keyed_records(collection, values.unwrap_or_default())?));
        }

        let settings = match raw.settings {
            None | Some(Value::Null) => None,
            Some(value) => {
                let record = Record::from_value(value)
                    .map_err(|e| BackupError::format(format!("settings: {}", e)))?;
                strip_settings_id(record)
            }
        };

        Ok(Self {
            export_date,
            version,
            bulk,
            settings,
        })
    }

    pub fn counts(&self) -> CollectionCounts {
        let mut counts = CollectionCounts::default();
        for (collection, records) in &self.bulk {
            counts.add(*collection, records.len());
        }
        counts
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            export_date: self.export_date.clone(),
            version: self.version.clone(),
            counts: self.counts(),
            has_settings: self.settings.is_some(),
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.version == BACKUP_VERSION
    }
}

/// What an artifact contains, without touching a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub export_date: String,
    pub version: String,
    pub counts: CollectionCounts,
    pub has_settings: bool,
}

fn required_string(value: Option<Value>, field: &str) -> Result<String, BackupError> {
    match value {
        None | Some(Value::Null) => Err(BackupError::format(format!("missing `{}`", field))),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(BackupError::format(format!("`{}` must be a string", field))),
    }
}

fn keyed_records(
    collection: Collection,
    values: Vec<Value>,
) -> Result<Vec<KeyedRecord>, BackupError> {
    let field = collection.snapshot_field();
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            Record::from_value(value)
                .and_then(KeyedRecord::from_snapshot)
                .map_err(|e| BackupError::format(format!("{}[{}]: {}", field, index, e)))
        })
        .collect()
}

/// An empty settings object means "no settings"; an inlined `id` is ignored
/// because settings always live under the fixed key.
fn strip_settings_id(record: Record) -> Option<Record> {
    let record = record.without_id();
    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}
