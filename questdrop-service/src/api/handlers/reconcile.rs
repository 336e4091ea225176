use super::types::{error_response, ReconcileEntryWire, ReconcileRequest};
use crate::api::middleware::auth::authorize;
use crate::api::state::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use questdrop_core::application::reconcile;
use questdrop_core::foundation::Identity;
use std::sync::Arc;

pub async fn handle_reconcile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Option<Json<ReconcileRequest>>,
) -> Response {
    if let Err(err) = authorize(&headers, state.api_token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, err).into_response();
    }

    let Json(request) = request.unwrap_or_default();
    let identities = match request.identities {
        None => None,
        Some(raw) => {
            let mut parsed = Vec::with_capacity(raw.len());
            for value in raw {
                match Identity::parse(&value) {
                    Ok(identity) => parsed.push(identity),
                    Err(err) => return error_response(&err),
                }
            }
            Some(parsed)
        }
    };

    match reconcile(&state.pipeline, identities).await {
        Ok(reports) => {
            let entries: Vec<ReconcileEntryWire> = reports
                .into_iter()
                .map(|report| ReconcileEntryWire::new(report.identity.to_string(), report.outcome))
                .collect();
            for entry in &entries {
                state.metrics.inc_reconcile_entry(entry.is_failed());
            }
            info!(
                "reconcile batch done entries={} failed={}",
                entries.len(),
                entries.iter().filter(|entry| entry.is_failed()).count()
            );
            Json(entries).into_response()
        }
        Err(err) => error_response(&err),
    }
}
