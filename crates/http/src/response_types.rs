//! Response types (Serialize)

use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{DatasetKind, minute_label};
use optchain_service::{
    BatchReport, ChainView, ChartData, Compare, DayView, IngestReport, PreviewPage, RowPolicy,
};
use optchain_storage::StorageStats;
use serde::Serialize;

use crate::api_error::ApiError;
use crate::render::charts::Figure;

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub index_rows_deleted: u64,
    pub option_rows_deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct DatesResponse {
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub stats: StorageStats,
    pub has_more: bool,
    pub page: PreviewPage,
}

/// Rows of the raw index or option endpoints.
#[derive(Debug, Serialize)]
pub struct RowsResponse<T> {
    pub count: usize,
    pub rows: Vec<T>,
}

impl<T> From<Vec<T>> for RowsResponse<T> {
    fn from(rows: Vec<T>) -> Self {
        Self { count: rows.len(), rows }
    }
}

#[derive(Debug, Serialize)]
pub struct FileResult {
    pub file_name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<IngestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub dataset: DatasetKind,
    pub policy: RowPolicy,
    pub succeeded: usize,
    pub failed: usize,
    pub files: Vec<FileResult>,
}

impl UploadResponse {
    /// Per-file results; failures carry the same message the status mapping exposes.
    pub fn from_batch(batch: BatchReport) -> Self {
        let succeeded = batch.succeeded();
        let failed = batch.failed();
        let files = batch
            .outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(report) => FileResult {
                    file_name: outcome.file_name,
                    ok: true,
                    summary: Some(report.summary_line()),
                    report: Some(report),
                    error: None,
                },
                Err(err) => FileResult {
                    file_name: outcome.file_name,
                    ok: false,
                    summary: None,
                    report: None,
                    error: Some(ApiError::from(err).into_public_message()),
                },
            })
            .collect();
        Self { dataset: batch.dataset, policy: batch.policy, succeeded, failed, files }
    }
}

/// The selected minute and the slider labels of a trade date.
#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub selected: Option<NaiveDateTime>,
    pub open_price: Option<f64>,
    pub slider_index: usize,
    pub session_minutes: Vec<String>,
    pub minutes_total: usize,
}

impl From<&DayView> for DaySummary {
    fn from(day: &DayView) -> Self {
        Self {
            date: day.date,
            selected: day.selected,
            open_price: day.open_price,
            slider_index: day.slider_index,
            session_minutes: day.session.iter().map(|bar| minute_label(bar.ts)).collect(),
            minutes_total: day.minutes.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChainResponse {
    pub date: Option<NaiveDate>,
    pub day: Option<DaySummary>,
    pub chain: Option<ChainView>,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub date: Option<NaiveDate>,
    pub compare: Compare,
    pub price: Option<Figure>,
    pub straddle: Option<Figure>,
    pub comparison: Option<Figure>,
    pub data: Option<ChartData>,
}
