use async_trait::async_trait;
use chrono::NaiveDate;
use optchain_core::{IndexRow, OptionRow};

use crate::error::StorageError;
use crate::types::{PaginatedResult, StorageStats};

/// Aggregate statistics and preview pages.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Get row counts.
    async fn get_stats(&self) -> Result<StorageStats, StorageError>;

    /// Distinct trade dates that have index data, newest first.
    async fn available_dates(&self) -> Result<Vec<NaiveDate>, StorageError>;

    /// Index rows, newest first.
    async fn index_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<IndexRow>, StorageError>;

    /// Option rows, newest first.
    async fn options_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<OptionRow>, StorageError>;
}
