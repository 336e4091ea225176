use super::types::{error_response, JourneyResponse};
use crate::api::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::debug;
use questdrop_core::application::check_completion;
use questdrop_core::domain::{IdentityJourney, ObjectiveCode};
use questdrop_core::foundation::Identity;
use std::sync::Arc;

/// Read-only derived journey for one identity. Composes the off-chain
/// completion snapshot with the persisted sync and eligibility records;
/// never mutates anything.
pub async fn handle_journey(State(state): State<Arc<AppState>>, Path(raw_identity): Path<String>) -> Response {
    let identity = match Identity::parse(&raw_identity) {
        Ok(identity) => identity,
        Err(err) => return error_response(&err),
    };

    let completion = match check_completion(&state.pipeline, &identity).await {
        Ok(completion) => completion,
        Err(err) => return error_response(&err),
    };
    let sync = match state.pipeline.state.sync_records_for(&identity) {
        Ok(sync) => sync,
        Err(err) => return error_response(&err),
    };
    let eligibility = match state.pipeline.state.get_eligibility(&identity) {
        Ok(eligibility) => eligibility,
        Err(err) => return error_response(&err),
    };

    let journey = IdentityJourney::derive(&completion, &sync, eligibility.as_ref());
    debug!("journey identity={} journey={:?}", identity, journey);
    Json(JourneyResponse {
        identity: identity.to_string(),
        journey,
        fully_complete: completion.fully_complete(),
        slacker_complete: completion.is_complete(ObjectiveCode::Slacker),
        overachiever_complete: completion.is_complete(ObjectiveCode::Overachiever),
        airdropped: eligibility.as_ref().map(|record| record.airdropped).unwrap_or(false),
        tx_id: eligibility.and_then(|record| record.tx_id),
    })
    .into_response()
}
