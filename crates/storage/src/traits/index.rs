use async_trait::async_trait;
use optchain_core::{DateRange, IndexRow};

use crate::error::StorageError;

/// Index minute bars keyed by timestamp.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Insert or replace rows by timestamp, all in one transaction.
    /// Returns the number of rows submitted.
    async fn upsert_index_rows(&self, rows: &[IndexRow]) -> Result<u64, StorageError>;

    /// Rows within the inclusive date range, ordered by timestamp.
    async fn query_index(&self, range: DateRange) -> Result<Vec<IndexRow>, StorageError>;
}
