use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, State};

use crate::AppState;
use crate::api_error::ApiError;
use crate::response_types::ResetResponse;

fn is_localhost(addr: &SocketAddr) -> bool {
    addr.ip().is_loopback()
}

/// Delete all index and option rows. Loopback callers only.
pub async fn admin_reset(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, ApiError> {
    if !is_localhost(&addr) {
        tracing::warn!(%addr, "rejected remote reset request");
        return Err(ApiError::Forbidden("reset is only allowed from localhost".to_owned()));
    }
    let summary = state.admin_service.reset().await?;
    Ok(Json(ResetResponse {
        success: true,
        index_rows_deleted: summary.index_rows_deleted,
        option_rows_deleted: summary.option_rows_deleted,
    }))
}
