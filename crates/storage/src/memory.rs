//! In-process backend with the same keying and ordering as MySQL.
//!
//! Each upsert takes the write lock once, so a batch lands all-or-nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{DateRange, IndexRow, OptionKey, OptionRow, TimeWindow, normalize_strike};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::{AdminStore, IndexStore, OptionStore, StatsStore};
use crate::types::{PaginatedResult, ResetSummary, StorageStats};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    index: RwLock<BTreeMap<NaiveDateTime, IndexRow>>,
    options: RwLock<BTreeMap<OptionKey, OptionRow>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the pool timed out.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::from(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn page<T: Clone>(rows: Vec<T>, offset: usize, limit: usize) -> PaginatedResult<T> {
    let total = u64::try_from(rows.len()).unwrap_or(u64::MAX);
    let items = rows.into_iter().skip(offset).take(limit).collect();
    PaginatedResult {
        items,
        total,
        offset: u64::try_from(offset).unwrap_or(0),
        limit: u64::try_from(limit).unwrap_or(0),
    }
}

#[async_trait]
impl IndexStore for MemoryStorage {
    async fn upsert_index_rows(&self, rows: &[IndexRow]) -> Result<u64, StorageError> {
        self.check()?;
        let mut index = self.index.write().await;
        for row in rows {
            index.insert(row.ts, row.clone());
        }
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    async fn query_index(&self, range: DateRange) -> Result<Vec<IndexRow>, StorageError> {
        self.check()?;
        let (lower, upper) = range.bounds();
        Ok(self.index.read().await.range(lower..upper).map(|(_, row)| row.clone()).collect())
    }
}

#[async_trait]
impl OptionStore for MemoryStorage {
    async fn upsert_options_rows(&self, rows: &[OptionRow]) -> Result<u64, StorageError> {
        self.check()?;
        let mut options = self.options.write().await;
        for row in rows {
            let mut row = row.clone();
            row.strike = normalize_strike(row.strike);
            options.insert(row.key(), row);
        }
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    async fn query_options(
        &self,
        date: NaiveDate,
        window: Option<TimeWindow>,
        expiry: Option<NaiveDate>,
    ) -> Result<Vec<OptionRow>, StorageError> {
        self.check()?;
        let (lower, upper) = DateRange::single(date).bounds();
        Ok(self
            .options
            .read()
            .await
            .values()
            .filter(|row| row.ts >= lower && row.ts < upper)
            .filter(|row| window.is_none_or(|w| w.contains(row.ts.time())))
            .filter(|row| expiry.is_none_or(|e| row.expiry == e))
            .cloned()
            .collect())
    }

    async fn options_at(
        &self,
        ts: NaiveDateTime,
        expiry: NaiveDate,
    ) -> Result<Vec<OptionRow>, StorageError> {
        self.check()?;
        Ok(self
            .options
            .read()
            .await
            .values()
            .filter(|row| row.ts == ts && row.expiry == expiry)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StatsStore for MemoryStorage {
    async fn get_stats(&self) -> Result<StorageStats, StorageError> {
        self.check()?;
        let index = self.index.read().await;
        let trading_days: BTreeSet<NaiveDate> = index.keys().map(NaiveDateTime::date).collect();
        Ok(StorageStats {
            index_rows: u64::try_from(index.len()).unwrap_or(u64::MAX),
            option_rows: u64::try_from(self.options.read().await.len()).unwrap_or(u64::MAX),
            trading_days: u64::try_from(trading_days.len()).unwrap_or(u64::MAX),
        })
    }

    async fn available_dates(&self) -> Result<Vec<NaiveDate>, StorageError> {
        self.check()?;
        let dates: BTreeSet<NaiveDate> =
            self.index.read().await.keys().map(NaiveDateTime::date).collect();
        Ok(dates.into_iter().rev().collect())
    }

    async fn index_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<IndexRow>, StorageError> {
        self.check()?;
        let rows: Vec<IndexRow> = self.index.read().await.values().rev().cloned().collect();
        Ok(page(rows, offset, limit))
    }

    async fn options_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<PaginatedResult<OptionRow>, StorageError> {
        self.check()?;
        let mut rows: Vec<OptionRow> = self.options.read().await.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.ts.cmp(&a.ts)
                .then(a.key().strike_ticks.cmp(&b.key().strike_ticks))
                .then(a.option_type.cmp(&b.option_type))
                .then(a.expiry.cmp(&b.expiry))
        });
        Ok(page(rows, offset, limit))
    }
}

#[async_trait]
impl AdminStore for MemoryStorage {
    async fn ping(&self) -> Result<(), StorageError> {
        self.check()
    }

    async fn reset(&self) -> Result<ResetSummary, StorageError> {
        self.check()?;
        let mut index = self.index.write().await;
        let mut options = self.options.write().await;
        let summary = ResetSummary {
            index_rows_deleted: u64::try_from(index.len()).unwrap_or(u64::MAX),
            option_rows_deleted: u64::try_from(options.len()).unwrap_or(u64::MAX),
        };
        index.clear();
        options.clear();
        Ok(summary)
    }
}
