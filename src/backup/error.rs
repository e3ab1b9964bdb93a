use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use super::CollectionCounts;
use crate::models::Collection;
use crate::store::StoreError;

/// Errors returned by export, import, inspect and clear.
///
/// Store failures never undo earlier successful writes or deletes.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Unparsable artifact or missing/invalid envelope fields. Raised before
    /// any store access.
    #[error("Invalid backup format: {0}")]
    Format(String),

    #[error("Failed to read {collection}: {source}")]
    StoreRead {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    /// `committed` holds the records written before the failure.
    #[error("Failed to write {collection}/{key} (committed before failure: {committed}): {source}")]
    StoreWrite {
        collection: Collection,
        key: String,
        committed: CollectionCounts,
        #[source]
        source: StoreError,
    },

    #[error("Failed to delete {collection}/{key}: {source}")]
    StoreDelete {
        collection: Collection,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode backup: {0}")]
    Encode(#[source] serde_json::Error),
}

impl BackupError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        BackupError::Format(reason.into())
    }

    /// Stable name of the error kind, used in structured results.
    pub fn kind(&self) -> &'static str {
        match self {
            BackupError::Format(_) => "FormatError",
            BackupError::StoreRead { .. } => "StoreReadError",
            BackupError::StoreWrite { .. } => "StoreWriteError",
            BackupError::StoreDelete { .. } => "StoreDeleteError",
            BackupError::Io { .. } => "IoError",
            BackupError::Encode(_) => "EncodeError",
        }
    }
}

/// Error half of an [`OperationResult`].
#[derive(Debug, Clone, Serialize)]
pub struct OperationError {
    pub kind: &'static str,
    pub message: String,
}

/// Structured success/failure envelope handed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl<T> From<Result<T, BackupError>> for OperationResult<T> {
    fn from(result: Result<T, BackupError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(OperationError {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            },
        }
    }
}
