//! Integration tests for MySqlStorage.
//! Run with: DATABASE_URL=mysql://... cargo test -p optchain-storage -- --ignored mysql_
//!
//! Tests share one database and call `reset`, so run them single-threaded.

#![allow(clippy::unwrap_used, reason = "integration test code")]

use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{DatabaseConfig, DateRange, IndexRow, OptionRow, OptionType, TimeWindow};
use optchain_storage::MySqlStorage;
use optchain_storage::traits::{AdminStore, IndexStore, OptionStore, StatsStore};

async fn create_mysql_storage() -> MySqlStorage {
    let config = DatabaseConfig::from_env();
    assert!(config.url.is_some(), "DATABASE_URL must be set for MySqlStorage integration tests");
    let storage = MySqlStorage::new(&config).await.expect("Failed to connect to MySQL");
    storage.reset().await.unwrap();
    storage
}

fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap()
}

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

#[tokio::test]
#[ignore]
async fn mysql_index_upsert_is_idempotent() {
    let storage = create_mysql_storage().await;
    let mut row = IndexRow::new(ts("2024-03-01 14:00"), 5100.25);
    row.volume = Some(1200);

    storage.upsert_index_rows(&[row.clone()]).await.unwrap();
    row.open = 5101.0;
    storage.upsert_index_rows(&[row]).await.unwrap();

    let rows = storage.query_index(DateRange::single(day("2024-03-01"))).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].open - 5101.0).abs() < f64::EPSILON);
    assert_eq!(rows[0].volume, Some(1200));
}

#[tokio::test]
#[ignore]
async fn mysql_options_round_trip_optional_columns() {
    let storage = create_mysql_storage().await;
    let at = ts("2024-03-01 13:45");
    let mut call = OptionRow::new(at, day("2024-03-01"), 5100.0, OptionType::Call, 3.1, 3.3);
    call.iv = Some(0.142);
    call.delta = Some(0.51);
    let put = OptionRow::new(at, day("2024-03-01"), 5100.0, OptionType::Put, 2.9, 3.1);

    storage.upsert_options_rows(&[put, call]).await.unwrap();

    let chain = storage.options_at(at, day("2024-03-01")).await.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].option_type, OptionType::Call);
    assert_eq!(chain[0].iv, Some(0.142));
    assert_eq!(chain[1].delta, None);

    let session = storage
        .query_options(day("2024-03-01"), Some(TimeWindow::regular_session()), None)
        .await
        .unwrap();
    assert_eq!(session.len(), 2);
}

#[tokio::test]
#[ignore]
async fn mysql_strikes_within_one_tick_share_a_row() {
    let storage = create_mysql_storage().await;
    let at = ts("2024-03-01 14:00");
    let first = OptionRow::new(at, day("2024-03-01"), 420.00001, OptionType::Call, 1.0, 1.2);
    let second = OptionRow::new(at, day("2024-03-01"), 420.00004, OptionType::Call, 2.0, 2.2);
    storage.upsert_options_rows(&[first]).await.unwrap();
    storage.upsert_options_rows(&[second]).await.unwrap();

    let chain = storage.options_at(at, day("2024-03-01")).await.unwrap();
    assert_eq!(chain.len(), 1);
    assert!((chain[0].strike - 420.0).abs() < f64::EPSILON);
    assert!((chain[0].bid_open - 2.0).abs() < f64::EPSILON);
}

#[tokio::test]
#[ignore]
async fn mysql_large_batch_spans_chunks() {
    let storage = create_mysql_storage().await;
    let start = ts("2024-03-01 13:30");
    let rows: Vec<IndexRow> = (0..1_250_i64)
        .map(|i| IndexRow::new(start + chrono::Duration::minutes(i), 5000.0))
        .collect();

    let written = storage.upsert_index_rows(&rows).await.unwrap();
    assert_eq!(written, 1_250);
    assert_eq!(storage.get_stats().await.unwrap().index_rows, 1_250);
}

#[tokio::test]
#[ignore]
async fn mysql_dates_and_pages_are_newest_first() {
    let storage = create_mysql_storage().await;
    storage
        .upsert_index_rows(&[
            IndexRow::new(ts("2024-03-01 14:00"), 1.0),
            IndexRow::new(ts("2024-03-04 14:00"), 2.0),
        ])
        .await
        .unwrap();

    assert_eq!(storage.available_dates().await.unwrap(), vec![day("2024-03-04"), day("2024-03-01")]);
    let page = storage.index_page(0, 1).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].ts, ts("2024-03-04 14:00"));
    assert!(page.has_more());
}
