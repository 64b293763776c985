use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use optchain_core::DatasetKind;
use optchain_service::{BatchReport, RowPolicy, UploadedFile};

use crate::AppState;
use crate::api_error::ApiError;
use crate::response_types::UploadResponse;

/// Fields of the upload form.
#[derive(Debug)]
pub(crate) struct UploadForm {
    pub dataset: DatasetKind,
    pub policy: RowPolicy,
    pub files: Vec<UploadedFile>,
}

/// Read `upload_type` (or `dataset`), optional `policy`, and one or more
/// `file` parts. Empty file inputs are ignored.
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut dataset = None;
    let mut policy = RowPolicy::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "upload_type" | "dataset" => {
                dataset = Some(field.text().await?.parse::<DatasetKind>()?);
            },
            "policy" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    policy = raw.parse()?;
                }
            },
            "file" | "files" => {
                let file_name = field.file_name().map(ToOwned::to_owned).unwrap_or_default();
                let content = field.bytes().await?;
                if file_name.is_empty() && content.is_empty() {
                    continue;
                }
                files.push(UploadedFile { name: file_name, content: content.to_vec() });
            },
            other => tracing::debug!(field = other, "ignoring unknown upload field"),
        }
    }

    let Some(dataset) = dataset else {
        return Err(ApiError::BadRequest("upload_type is required (index or options)".to_owned()));
    };
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files selected!".to_owned()));
    }
    Ok(UploadForm { dataset, policy, files })
}

/// 200 when every file was stored, otherwise the status of the most severe failure.
pub(crate) fn batch_status(batch: &BatchReport) -> StatusCode {
    match batch.worst_error() {
        None => StatusCode::OK,
        Some(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        Some(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn api_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;
    let batch = state.ingest_service.ingest_batch(form.files, form.dataset, form.policy).await;
    let status = batch_status(&batch);
    Ok((status, Json(UploadResponse::from_batch(batch))))
}
