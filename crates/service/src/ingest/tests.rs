use std::sync::Arc;

use chrono::NaiveDate;
use optchain_core::{DateRange, DatasetKind, OptionType};
use optchain_storage::traits::{IndexStore, OptionStore, StatsStore};
use optchain_storage::{MemoryStorage, SharedStore};

use super::*;

const INDEX_CSV: &str = "\
datetime_UTC,open,high,low,close,volume
2024-03-01 13:30:00,5100.25,5101.00,5099.50,5100.75,1200
2024-03-01 13:31:00,5100.75,5102.00,5100.00,5101.50,800
2024-03-01 13:32:00,5101.50,,,,
";

const OPTIONS_CSV: &str = "\
UTC_MINUTE,EXPIRY_DATE,STRIKE,OPTION_TYPE,bid_open,ask_open,iv
1709300400,2024-03-01,5100,C,3.10,3.30,0.1234567
1709300400,2024-03-01,5100,P,2.90,3.10,
1709300400,2024-03-02,5100,C,6.10,6.40,
";

fn setup() -> (Arc<MemoryStorage>, IngestService) {
    let store = Arc::new(MemoryStorage::new());
    let shared: SharedStore = store.clone();
    (store, IngestService::new(shared))
}

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

#[tokio::test]
async fn reupload_is_idempotent() {
    let (store, service) = setup();
    service.ingest("spy.csv", INDEX_CSV.as_bytes(), DatasetKind::Index, RowPolicy::Reject).await.unwrap();
    let once = store.get_stats().await.unwrap();
    service.ingest("spy.csv", INDEX_CSV.as_bytes(), DatasetKind::Index, RowPolicy::Reject).await.unwrap();
    let twice = store.get_stats().await.unwrap();
    assert_eq!(once.index_rows, 3);
    assert_eq!(once, twice);
}

#[tokio::test]
async fn values_read_back_exactly() {
    let (store, service) = setup();
    service
        .ingest("opts.csv", OPTIONS_CSV.as_bytes(), DatasetKind::Options, RowPolicy::Reject)
        .await
        .unwrap();
    let rows = store.query_options(march_first(), None, Some(march_first())).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].option_type, OptionType::Call);
    assert_eq!(rows[0].bid_open, 3.10);
    assert_eq!(rows[0].iv, Some(0.123_456_7));
    assert_eq!(rows[1].iv, None);

    service.ingest("spy.csv", INDEX_CSV.as_bytes(), DatasetKind::Index, RowPolicy::Reject).await.unwrap();
    let index = store.query_index(DateRange::single(march_first())).await.unwrap();
    assert_eq!(index[0].open, 5100.25);
    assert_eq!(index[0].volume, Some(1200));
    assert_eq!(index[2].high, None);
}

#[tokio::test]
async fn missing_required_column_persists_nothing() {
    let (store, service) = setup();
    let csv = "datetime_UTC,close\n2024-03-01 13:30,5100\n";
    let err = service
        .ingest("spy.csv", csv.as_bytes(), DatasetKind::Index, RowPolicy::Skip)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Ingest(IngestError::MissingColumns(ref cols)) if cols == &["open"]));
    assert!(err.is_client_error());
    assert_eq!(store.get_stats().await.unwrap().index_rows, 0);
}

#[tokio::test]
async fn reject_policy_stops_at_first_bad_row() {
    let (store, service) = setup();
    let csv = "datetime_UTC,open\n2024-03-01 13:30,5100\nnot-a-date,5101\n2024-03-01 13:32,x\n";
    let err = service
        .ingest("spy.csv", csv.as_bytes(), DatasetKind::Index, RowPolicy::Reject)
        .await
        .unwrap_err();
    match err {
        ServiceError::Ingest(IngestError::InvalidRow { line, reason }) => {
            assert_eq!(line, 3);
            assert!(reason.contains("datetime_UTC"));
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.get_stats().await.unwrap().index_rows, 0);
}

#[tokio::test]
async fn absurd_prices_are_rejected_before_storage() {
    let (store, service) = setup();
    let csv = "datetime_UTC,open\n2024-03-01 14:00,1000000000000000\n";
    let err = service
        .ingest("spy.csv", csv.as_bytes(), DatasetKind::Index, RowPolicy::Reject)
        .await
        .unwrap_err();
    match err {
        ServiceError::Ingest(IngestError::InvalidRow { line, reason }) => {
            assert_eq!(line, 2);
            assert!(reason.contains("must not exceed"));
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.get_stats().await.unwrap().index_rows, 0);
}

#[tokio::test]
async fn skip_policy_reports_bad_rows_and_writes_the_rest() {
    let (store, service) = setup();
    let csv = "datetime_UTC,open\n2024-03-01 13:30,5100\nnot-a-date,5101\n2024-03-01 13:32,x\n";
    let report = service
        .ingest("spy.csv", csv.as_bytes(), DatasetKind::Index, RowPolicy::Skip)
        .await
        .unwrap();
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.issues.iter().map(|i| i.line).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(report.summary_line(), "spy.csv - 3 \u{2192} 1 (2 invalid)");
    assert_eq!(store.get_stats().await.unwrap().index_rows, 1);
}

#[tokio::test]
async fn skip_policy_caps_reported_issues() {
    let (_, service) = setup();
    let mut csv = String::from("datetime_UTC,open\n2024-03-01 13:30,5100\n");
    for _ in 0..30 {
        csv.push_str("bad,1\n");
    }
    let report = service
        .ingest("spy.csv", csv.as_bytes(), DatasetKind::Index, RowPolicy::Skip)
        .await
        .unwrap();
    assert_eq!(report.skipped, 30);
    assert_eq!(report.issues.len(), MAX_REPORTED_ROW_ISSUES);
}

#[tokio::test]
async fn file_without_valid_rows_is_rejected() {
    let (_, service) = setup();
    let err = service
        .ingest("spy.csv", b"datetime_UTC,open\nbad,1\n", DatasetKind::Index, RowPolicy::Skip)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Ingest(IngestError::NoValidRows { skipped: 1 })));

    let err = service
        .ingest("spy.csv", b"datetime_UTC,open\n", DatasetKind::Index, RowPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Ingest(IngestError::NoValidRows { skipped: 0 })));
}

#[tokio::test]
async fn duplicate_keys_collapse_to_last_row() {
    let (store, service) = setup();
    let csv = "datetime_UTC,open\n2024-03-01 13:30,5100\n2024-03-01 13:30:45,5105\n";
    let report = service
        .ingest("spy.csv", csv.as_bytes(), DatasetKind::Index, RowPolicy::Reject)
        .await
        .unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(report.duplicates_collapsed, 1);
    let rows = store.query_index(DateRange::single(march_first())).await.unwrap();
    assert_eq!(rows[0].open, 5105.0);
}

#[tokio::test]
async fn batch_handles_files_independently() {
    let (store, service) = setup();
    let files = vec![
        UploadedFile { name: "notes.txt".to_owned(), content: b"hello".to_vec() },
        UploadedFile { name: "SPY.CSV".to_owned(), content: INDEX_CSV.as_bytes().to_vec() },
    ];
    let batch = service.ingest_batch(files, DatasetKind::Index, RowPolicy::Reject).await;
    assert_eq!(batch.succeeded(), 1);
    assert_eq!(batch.failed(), 1);
    assert!(matches!(
        batch.outcomes[0].result,
        Err(ServiceError::Ingest(IngestError::NotCsv(_)))
    ));
    assert!(batch.worst_error().is_some_and(ServiceError::is_client_error));
    assert_eq!(store.get_stats().await.unwrap().index_rows, 3);
}

#[tokio::test]
async fn unavailable_database_is_transient() {
    let (store, service) = setup();
    store.set_unavailable(true);
    let batch = service
        .ingest_batch(
            vec![UploadedFile { name: "spy.csv".to_owned(), content: INDEX_CSV.as_bytes().to_vec() }],
            DatasetKind::Index,
            RowPolicy::Reject,
        )
        .await;
    assert!(batch.worst_error().is_some_and(ServiceError::is_transient));
}

#[test]
fn row_policy_parses() {
    assert_eq!("SKIP".parse::<RowPolicy>().unwrap(), RowPolicy::Skip);
    assert_eq!(RowPolicy::default(), RowPolicy::Reject);
    assert!("maybe".parse::<RowPolicy>().is_err());
}
