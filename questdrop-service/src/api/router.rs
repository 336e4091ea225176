use super::handlers::health::{handle_health, handle_metrics, handle_ready};
use super::handlers::journey::handle_journey;
use super::handlers::reconcile::handle_reconcile;
use super::handlers::webhook::handle_webhook;
use super::middleware::logging::logging_middleware;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use questdrop_core::foundation::QuestDropError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_http_server(addr: SocketAddr, state: Arc<AppState>) -> Result<(), QuestDropError> {
    info!("binding http server addr={}", addr);
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server ready and accepting connections addr={}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            error!("HTTP server terminated unexpectedly addr={} error={}", addr, err);
            QuestDropError::Message(err.to_string())
        })
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/reconcile", post(handle_reconcile))
        .route("/identity/:identity/journey", get(handle_journey))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(axum::middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to install shutdown handler error={}", err);
    } else {
        info!("shutdown signal received");
    }
}
