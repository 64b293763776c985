#![allow(clippy::single_call_fn, reason = "HTTP handlers are called once from router")]

pub mod admin;
pub mod data;
pub mod upload;

use chrono::NaiveDate;
use optchain_service::QueryService;

use crate::api_error::ApiError;

/// The requested date, or the newest trade date when none was given.
/// `None` only when nothing has been uploaded yet.
pub(crate) async fn resolve_date(
    query: &QueryService,
    requested: Option<NaiveDate>,
) -> Result<Option<NaiveDate>, ApiError> {
    match requested {
        Some(date) => Ok(Some(date)),
        None => Ok(query.available_dates().await?.first().copied()),
    }
}
