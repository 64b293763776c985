use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::ResetSummary;

/// Health checks and destructive maintenance.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Round-trip to the backend.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Delete every stored row.
    async fn reset(&self) -> Result<ResetSummary, StorageError>;
}
