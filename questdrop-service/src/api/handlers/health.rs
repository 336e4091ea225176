use crate::api::state::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, trace};
use std::sync::Arc;

pub async fn handle_health() -> impl IntoResponse {
    trace!("health check: ok");
    Json(serde_json::json!({
        "status": "healthy",
    }))
}

pub async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    let state_ok = state.pipeline.state.health_check().is_ok();
    let status = if state_ok { "ready" } else { "degraded" };
    if state_ok {
        trace!("ready check: ok");
    } else {
        debug!("ready check: degraded state_ok={}", state_ok);
    }
    Json(serde_json::json!({
        "status": status,
        "state_store_ok": state_ok,
    }))
    .into_response()
}

pub async fn handle_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => {
            let mut response = body.into_response();
            response
                .headers_mut()
                .insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));
            response
        }
        Err(err) => {
            debug!("metrics encode failed error={}", err);
            let mut response = format!("metrics_error: {}", err).into_response();
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
