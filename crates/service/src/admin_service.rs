use optchain_core::{DatasetKind, IndexRow, MAX_QUERY_LIMIT, OptionRow};
use optchain_storage::traits::{AdminStore, StatsStore};
use optchain_storage::{PaginatedResult, ResetSummary, SharedStore, StorageStats};
use serde::Serialize;

use crate::error::ServiceError;

/// A newest-first page of either dataset.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "dataset", rename_all = "lowercase")]
pub enum PreviewPage {
    Index(PaginatedResult<IndexRow>),
    Options(PaginatedResult<OptionRow>),
}

impl PreviewPage {
    pub fn has_more(&self) -> bool {
        match self {
            Self::Index(page) => page.has_more(),
            Self::Options(page) => page.has_more(),
        }
    }
}

pub struct AdminService {
    storage: SharedStore,
}

impl AdminService {
    #[must_use]
    pub const fn new(storage: SharedStore) -> Self {
        Self { storage }
    }

    pub async fn stats(&self) -> Result<StorageStats, ServiceError> {
        Ok(self.storage.get_stats().await?)
    }

    /// `limit` is clamped to `1..=MAX_QUERY_LIMIT`.
    pub async fn preview(
        &self,
        dataset: DatasetKind,
        offset: usize,
        limit: usize,
    ) -> Result<PreviewPage, ServiceError> {
        let limit = limit.clamp(1, MAX_QUERY_LIMIT);
        Ok(match dataset {
            DatasetKind::Index => PreviewPage::Index(self.storage.index_page(offset, limit).await?),
            DatasetKind::Options => {
                PreviewPage::Options(self.storage.options_page(offset, limit).await?)
            },
        })
    }

    pub async fn index_preview(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<IndexRow>, ServiceError> {
        Ok(self.storage.index_page(offset, limit.clamp(1, MAX_QUERY_LIMIT)).await?)
    }

    pub async fn options_preview(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<OptionRow>, ServiceError> {
        Ok(self.storage.options_page(offset, limit.clamp(1, MAX_QUERY_LIMIT)).await?)
    }

    pub async fn readiness(&self) -> Result<(), ServiceError> {
        Ok(self.storage.ping().await?)
    }

    /// Delete every stored row.
    pub async fn reset(&self) -> Result<ResetSummary, ServiceError> {
        let summary = self.storage.reset().await?;
        tracing::warn!(
            index_rows = summary.index_rows_deleted,
            option_rows = summary.option_rows_deleted,
            "all market data deleted"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use optchain_storage::MemoryStorage;
    use optchain_storage::traits::IndexStore;

    use super::*;

    #[tokio::test]
    async fn preview_clamps_limit_and_reset_empties() {
        let store = Arc::new(MemoryStorage::new());
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(13, 30, 0).unwrap();
        let rows: Vec<IndexRow> = (0..3)
            .map(|i| IndexRow::new(start + chrono::Duration::minutes(i), 5000.0))
            .collect();
        store.upsert_index_rows(&rows).await.unwrap();
        let service = AdminService::new(store);

        match service.preview(DatasetKind::Index, 0, 0).await.unwrap() {
            PreviewPage::Index(page) => {
                assert_eq!(page.limit, 1);
                assert_eq!(page.items.len(), 1);
                assert_eq!(page.total, 3);
            },
            PreviewPage::Options(_) => panic!("wrong dataset"),
        }

        let summary = service.reset().await.unwrap();
        assert_eq!(summary.index_rows_deleted, 3);
        assert_eq!(service.stats().await.unwrap().index_rows, 0);
    }

    #[tokio::test]
    async fn readiness_reflects_database_state() {
        let store = Arc::new(MemoryStorage::new());
        let service = AdminService::new(store.clone());
        assert!(service.readiness().await.is_ok());
        store.set_unavailable(true);
        assert!(service.readiness().await.unwrap_err().is_transient());
    }
}
