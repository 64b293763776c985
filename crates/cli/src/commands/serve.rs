use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use optchain_core::AppConfig;
use optchain_http::{AppState, RouterLimits, create_router};
use optchain_storage::SharedStore;

use crate::connect;

pub(crate) async fn run(config: AppConfig) -> Result<()> {
    let storage: SharedStore = Arc::new(connect(&config.database).await?);
    let state = Arc::new(AppState::new(storage, config.strike_increment));
    let router = create_router(state, RouterLimits::from(&config));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        database = %config.database.target(),
        "Starting HTTP server"
    );
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
