use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{OptionRow, TimeWindow};

use crate::error::StorageError;

/// Option quotes keyed by (timestamp, expiry, strike, type).
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Insert or replace rows by key, all in one transaction.
    /// Returns the number of rows submitted.
    async fn upsert_options_rows(&self, rows: &[OptionRow]) -> Result<u64, StorageError>;

    /// Quotes traded on `date`, optionally restricted to a time-of-day window
    /// and one expiry. Ordered by timestamp, strike, type, expiry.
    async fn query_options(
        &self,
        date: NaiveDate,
        window: Option<TimeWindow>,
        expiry: Option<NaiveDate>,
    ) -> Result<Vec<OptionRow>, StorageError>;

    /// The chain for one minute and expiry, ordered by strike then type.
    async fn options_at(
        &self,
        ts: NaiveDateTime,
        expiry: NaiveDate,
    ) -> Result<Vec<OptionRow>, StorageError>;
}
