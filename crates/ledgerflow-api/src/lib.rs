//! HTTP API server
//!
//! Routes are organized into modules:
//! - routes::filter_flow: entry filtering, field options and report downloads

pub mod error;
pub mod routes;

use axum::{routing::get, Router};
use ledgerflow_config::Config;
use ledgerflow_core::FilterFlow;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<FilterFlow>,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::filter_flow::{api_download_excel, api_download_pdf, api_filter_entry_flow};

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/filter-flow/filter-entry-flow", get(api_filter_entry_flow))
        .route("/api/filter-flow/download/:filterId", get(api_download_pdf))
        .route("/api/filter-flow/download-excel/:filterId", get(api_download_excel))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Bind and serve until the listener fails or the process receives Ctrl-C
pub async fn start_server(config: Config, flow: Arc<FilterFlow>) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let state = AppState { flow, config };
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting ledgerflow server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /api/filter-flow/filter-entry-flow (entries or field options)");
    log::info!("  - /api/filter-flow/download/:filterId (PDF report)");
    log::info!("  - /api/filter-flow/download-excel/:filterId (spreadsheet)");
    log::info!("  - /api/health");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
