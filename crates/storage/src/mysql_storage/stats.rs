//! StatsStore implementation for MySqlStorage.

use super::*;

use crate::traits::StatsStore;
use crate::types::{PaginatedResult, StorageStats};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
impl StatsStore for MySqlStorage {
    async fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let index_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM index_data").fetch_one(&self.pool).await?;
        let option_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM option_data").fetch_one(&self.pool).await?;
        let trading_days: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT DATE(ts)) FROM index_data")
            .fetch_one(&self.pool)
            .await?;
        Ok(StorageStats {
            index_rows: count_to_u64(index_rows),
            option_rows: count_to_u64(option_rows),
            trading_days: count_to_u64(trading_days),
        })
    }

    async fn available_dates(&self) -> Result<Vec<NaiveDate>, StorageError> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT DISTINCT DATE(ts) AS trade_date FROM index_data ORDER BY trade_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }

    async fn index_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<IndexRow>, StorageError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM index_data").fetch_one(&self.pool).await?;
        let rows = sqlx::query(&format!(
            "SELECT {INDEX_COLUMNS} FROM index_data ORDER BY ts DESC LIMIT ? OFFSET ?"
        ))
        .bind(usize_to_i64(limit))
        .bind(usize_to_i64(offset))
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_index).collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResult {
            items,
            total: count_to_u64(total),
            offset: u64::try_from(offset).unwrap_or(0),
            limit: u64::try_from(limit).unwrap_or(0),
        })
    }

    async fn options_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<OptionRow>, StorageError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM option_data").fetch_one(&self.pool).await?;
        let rows = sqlx::query(&format!(
            "SELECT {OPTION_COLUMNS} FROM option_data
              ORDER BY ts DESC, strike, option_type, expiry LIMIT ? OFFSET ?"
        ))
        .bind(usize_to_i64(limit))
        .bind(usize_to_i64(offset))
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_option).collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResult {
            items,
            total: count_to_u64(total),
            offset: u64::try_from(offset).unwrap_or(0),
            limit: u64::try_from(limit).unwrap_or(0),
        })
    }
}
