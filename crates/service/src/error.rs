//! Typed error enums for the service layer.
//!
//! `IngestError` describes why a CSV file was refused; `ServiceError` unifies
//! it with storage failures so handlers can pick a status code by matching.

use optchain_core::CoreError;
use optchain_storage::StorageError;
use thiserror::Error;

/// Why an uploaded file was refused. Nothing from the file is written.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} is not a CSV file")]
    NotCsv(String),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("no valid rows ({skipped} skipped)")]
    NoValidRows { skipped: u64 },

    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Service-layer error unifying storage and ingestion failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (database unreachable, corrupt row, ...).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Uploaded CSV was rejected.
    #[error("ingest: {0}")]
    Ingest(#[from] IngestError),

    /// Caller provided an invalid parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Whether the database is unavailable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_transient())
    }

    /// Whether the caller sent something unusable (bad CSV or parameter).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Ingest(_) | Self::InvalidInput(_))
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
