//! HTTP server for optchain: CSV upload, data preview, option chain and
//! straddle charts, as HTML pages and a JSON API.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(unused_results, reason = "Some results are intentionally ignored")]
#![allow(clippy::arithmetic_side_effects, reason = "Arithmetic is safe in context")]
#![allow(missing_copy_implementations, reason = "Types may grow")]
#![allow(clippy::let_underscore_untyped, reason = "Type is clear from context")]
#![allow(let_underscore_drop, reason = "Intentionally dropping values")]
#![allow(clippy::ref_patterns, reason = "Ref patterns are clearer")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::else_if_without_else, reason = "Else not always needed")]
#![allow(clippy::shadow_reuse, reason = "Shadowing for Arc clones is idiomatic")]
#![allow(clippy::shadow_unrelated, reason = "Shadowing in async blocks is idiomatic")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]
#![allow(clippy::format_push_string, reason = "HTML is assembled with format!")]

pub mod api_error;
mod handlers;
mod pages;
mod query_types;
mod render;
mod response_types;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use optchain_core::AppConfig;
use optchain_service::{AdminService, IngestService, QueryService};
use optchain_storage::SharedStore;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use response_types::{ReadinessResponse, VersionResponse};

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// CSV ingestion into the store
    pub ingest_service: Arc<IngestService>,
    /// Dates, day views, chains and chart series
    pub query_service: Arc<QueryService>,
    /// Stats, previews, readiness and reset
    pub admin_service: Arc<AdminService>,
}

impl AppState {
    pub fn new(storage: SharedStore, strike_increment: f64) -> Self {
        Self {
            ingest_service: Arc::new(IngestService::new(Arc::clone(&storage))),
            query_service: Arc::new(QueryService::new(Arc::clone(&storage), strike_increment)),
            admin_service: Arc::new(AdminService::new(storage)),
        }
    }
}

/// Router limits taken from [`AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RouterLimits {
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl From<&AppConfig> for RouterLimits {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

pub fn create_router(state: Arc<AppState>, limits: RouterLimits) -> Router {
    Router::new()
        .route("/", get(pages::home).post(pages::home_upload))
        .route("/view", get(pages::view))
        .route("/options_chain", get(pages::options_chain))
        .route("/health", get(health))
        .route("/api/readiness", get(readiness))
        .route("/api/version", get(version))
        .route("/api/upload", post(handlers::upload::api_upload))
        .route("/api/dates", get(handlers::data::get_dates))
        .route("/api/preview", get(handlers::data::get_preview))
        .route("/api/index", get(handlers::data::get_index_rows))
        .route("/api/options", get(handlers::data::get_option_rows))
        .route("/api/chain", get(handlers::data::get_chain))
        .route("/api/charts", get(handlers::data::get_charts))
        .route("/api/admin/reset", post(handlers::admin::admin_reset))
        .layer(DefaultBodyLimit::max(limits.max_upload_bytes))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    match state.admin_service.readiness().await {
        Ok(()) => (StatusCode::OK, Json(ReadinessResponse { status: "ready", message: None })),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable",
                    message: Some("database unavailable".to_owned()),
                }),
            )
        },
    }
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
