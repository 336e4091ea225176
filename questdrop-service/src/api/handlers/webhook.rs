use super::types::{error_response, WebhookRequest, WebhookResponse};
use crate::api::middleware::auth::authorize;
use crate::api::state::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use questdrop_core::application::handle_objective_event;
use questdrop_core::domain::HandlerResult;
use std::sync::Arc;

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<WebhookRequest>,
) -> Response {
    if let Err(err) = authorize(&headers, state.api_token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }

    match handle_objective_event(&state.pipeline, &request.identity, &request.objective_code).await {
        Ok(result) => {
            match &result {
                HandlerResult::Unrecognized { code } => {
                    state.metrics.inc_webhook("unrecognized");
                    info!("webhook ignored code={}", code);
                }
                HandlerResult::Processed { objective, sync, airdrop, .. } => {
                    state.metrics.inc_webhook("processed");
                    state.metrics.inc_sync(sync.already_synced);
                    if airdrop.as_ref().is_some_and(|a| a.airdropped && !a.already_claimed) {
                        state.metrics.inc_airdrop_issued();
                    }
                    info!("webhook processed objective={} already_synced={}", objective, sync.already_synced);
                }
            }
            Json(WebhookResponse::from(result)).into_response()
        }
        Err(err) => {
            state.metrics.inc_webhook(if err.kind() == questdrop_core::foundation::ErrorKind::Validation {
                "rejected"
            } else {
                "error"
            });
            error_response(&err)
        }
    }
}
