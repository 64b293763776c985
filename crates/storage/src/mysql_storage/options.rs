//! OptionStore implementation for MySqlStorage.

use super::*;

use crate::traits::OptionStore;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{DateRange, TimeWindow, UPSERT_CHUNK_ROWS, normalize_strike};
use sqlx::{MySql, QueryBuilder};

#[async_trait]
impl OptionStore for MySqlStorage {
    async fn upsert_options_rows(&self, rows: &[OptionRow]) -> Result<u64, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK_ROWS) {
            let mut qb: QueryBuilder<'_, MySql> =
                QueryBuilder::new(format!("INSERT INTO option_data ({OPTION_COLUMNS}) "));
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.ts)
                    .push_bind(row.expiry)
                    .push_bind(normalize_strike(row.strike))
                    .push_bind(row.option_type.as_str())
                    .push_bind(row.bid_open)
                    .push_bind(row.ask_open)
                    .push_bind(row.bid_close)
                    .push_bind(row.ask_close)
                    .push_bind(row.volume)
                    .push_bind(row.open_interest)
                    .push_bind(row.iv)
                    .push_bind(row.delta)
                    .push_bind(row.gamma)
                    .push_bind(row.theta)
                    .push_bind(row.vega);
            });
            qb.push(
                " ON DUPLICATE KEY UPDATE
                   bid_open = VALUES(bid_open),
                   ask_open = VALUES(ask_open),
                   bid_close = VALUES(bid_close),
                   ask_close = VALUES(ask_close),
                   volume = VALUES(volume),
                   open_interest = VALUES(open_interest),
                   iv = VALUES(iv),
                   delta = VALUES(delta),
                   gamma = VALUES(gamma),
                   theta = VALUES(theta),
                   vega = VALUES(vega)",
            );
            qb.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    async fn query_options(
        &self,
        date: NaiveDate,
        window: Option<TimeWindow>,
        expiry: Option<NaiveDate>,
    ) -> Result<Vec<OptionRow>, StorageError> {
        let (lower, upper) = DateRange::single(date).bounds();
        let mut qb: QueryBuilder<'_, MySql> =
            QueryBuilder::new(format!("SELECT {OPTION_COLUMNS} FROM option_data WHERE ts >= "));
        qb.push_bind(lower).push(" AND ts < ").push_bind(upper);
        if let Some(window) = window {
            qb.push(" AND TIME(ts) BETWEEN ")
                .push_bind(window.start)
                .push(" AND ")
                .push_bind(window.end);
        }
        if let Some(expiry) = expiry {
            qb.push(" AND expiry = ").push_bind(expiry);
        }
        qb.push(" ORDER BY ts, strike, option_type, expiry");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_option).collect()
    }

    async fn options_at(
        &self,
        ts: NaiveDateTime,
        expiry: NaiveDate,
    ) -> Result<Vec<OptionRow>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {OPTION_COLUMNS} FROM option_data
              WHERE ts = ? AND expiry = ?
              ORDER BY strike, option_type"
        ))
        .bind(ts)
        .bind(expiry)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_option).collect()
    }
}
