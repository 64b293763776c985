//! IndexStore implementation for MySqlStorage.

use super::*;

use crate::traits::IndexStore;
use async_trait::async_trait;
use optchain_core::{DateRange, UPSERT_CHUNK_ROWS};
use sqlx::{MySql, QueryBuilder};

#[async_trait]
impl IndexStore for MySqlStorage {
    async fn upsert_index_rows(&self, rows: &[IndexRow]) -> Result<u64, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK_ROWS) {
            let mut qb: QueryBuilder<'_, MySql> =
                QueryBuilder::new(format!("INSERT INTO index_data ({INDEX_COLUMNS}) "));
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.ts)
                    .push_bind(row.open)
                    .push_bind(row.high)
                    .push_bind(row.low)
                    .push_bind(row.close)
                    .push_bind(row.volume);
            });
            qb.push(
                " ON DUPLICATE KEY UPDATE
                   open_price = VALUES(open_price),
                   high_price = VALUES(high_price),
                   low_price = VALUES(low_price),
                   close_price = VALUES(close_price),
                   volume = VALUES(volume)",
            );
            qb.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    async fn query_index(&self, range: DateRange) -> Result<Vec<IndexRow>, StorageError> {
        let (lower, upper) = range.bounds();
        let rows = sqlx::query(&format!(
            "SELECT {INDEX_COLUMNS} FROM index_data WHERE ts >= ? AND ts < ? ORDER BY ts"
        ))
        .bind(lower)
        .bind(upper)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_index).collect()
    }
}
