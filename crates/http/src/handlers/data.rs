use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use optchain_core::{IndexRow, OptionRow};

use crate::AppState;
use crate::api_error::ApiError;
use crate::handlers::resolve_date;
use crate::query_types::{ChainQuery, PreviewQuery, RowsQuery};
use crate::render::charts::{comparison_figure, price_figure, straddle_figure};
use crate::response_types::{
    ChainResponse, ChartsResponse, DatesResponse, DaySummary, PreviewResponse, RowsResponse,
};

pub async fn get_dates(State(state): State<Arc<AppState>>) -> Result<Json<DatesResponse>, ApiError> {
    let dates = state.query_service.available_dates().await?;
    Ok(Json(DatesResponse { dates }))
}

pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let dataset = query.dataset()?;
    let page = state.admin_service.preview(dataset, query.offset, query.capped_limit()).await?;
    let stats = state.admin_service.stats().await?;
    Ok(Json(PreviewResponse { stats, has_more: page.has_more(), page }))
}

pub async fn get_index_rows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<RowsResponse<IndexRow>>, ApiError> {
    let range = query.date_range()?;
    Ok(Json(state.query_service.index_rows(range).await?.into()))
}

pub async fn get_option_rows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<RowsResponse<OptionRow>>, ApiError> {
    let (date, filter) = query.option_filter()?;
    Ok(Json(state.query_service.option_rows(date, filter).await?.into()))
}

pub async fn get_chain(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ChainResponse>, ApiError> {
    let params = query.validate()?;
    let Some(date) = resolve_date(&state.query_service, params.date).await? else {
        return Ok(Json(ChainResponse { date: None, day: None, chain: None }));
    };
    let day = state.query_service.day_view(date, params.time.as_deref()).await?;
    let chain = state.query_service.chain_for(&day, params.dte, params.steps).await?;
    Ok(Json(ChainResponse {
        date: Some(date),
        day: Some(DaySummary::from(&day)),
        chain: Some(chain),
    }))
}

pub async fn get_charts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ChartsResponse>, ApiError> {
    let params = query.validate()?;
    let Some(date) = resolve_date(&state.query_service, params.date).await? else {
        return Ok(Json(ChartsResponse {
            date: None,
            compare: params.compare,
            price: None,
            straddle: None,
            comparison: None,
            data: None,
        }));
    };
    let data = state.query_service.charts(date).await?;
    Ok(Json(ChartsResponse {
        date: Some(date),
        compare: params.compare,
        price: Some(price_figure(&data)),
        straddle: Some(straddle_figure(&data)),
        comparison: Some(comparison_figure(&data, params.compare)),
        data: Some(data),
    }))
}
