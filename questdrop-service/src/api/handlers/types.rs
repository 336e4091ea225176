use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use questdrop_core::domain::{AirdropResult, HandlerResult, IdentityJourney, ObjectiveCode, ReconcileOutcome};
use questdrop_core::foundation::{ErrorKind, QuestDropError, TransactionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub identity: String,
    pub objective_code: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WebhookResponse {
    Unrecognized {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Processed {
        objective: ObjectiveCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_id: Option<TransactionId>,
        already_synced: bool,
        fully_complete: bool,
        slacker_complete: bool,
        overachiever_complete: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        airdrop: Option<AirdropWire>,
    },
}

impl From<HandlerResult> for WebhookResponse {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Unrecognized { .. } => Self::Unrecognized { message: "not a recognized objective".to_string() },
            HandlerResult::Processed { objective, sync, completion, airdrop } => Self::Processed {
                objective,
                tx_id: sync.tx_id,
                already_synced: sync.already_synced,
                fully_complete: completion.fully_complete(),
                slacker_complete: completion.is_complete(ObjectiveCode::Slacker),
                overachiever_complete: completion.is_complete(ObjectiveCode::Overachiever),
                airdrop: airdrop.map(AirdropWire::from),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropWire {
    pub eligible: bool,
    pub has_collection: bool,
    pub airdropped: bool,
    pub already_claimed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<TransactionId>,
}

impl From<AirdropResult> for AirdropWire {
    fn from(result: AirdropResult) -> Self {
        Self {
            eligible: result.eligible,
            has_collection: result.has_collection,
            airdropped: result.airdropped,
            already_claimed: result.already_claimed,
            tx_id: result.tx_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileRequest {
    /// Explicit targets; omitted means store-driven discovery.
    #[serde(default)]
    pub identities: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum ReconcileEntryWire {
    #[serde(rename_all = "camelCase")]
    Completed {
        identity: String,
        eligible: bool,
        has_collection: bool,
        airdropped: bool,
        already_claimed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_id: Option<TransactionId>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        identity: String,
        error: String,
        error_kind: String,
    },
}

impl ReconcileEntryWire {
    pub fn new(identity: String, outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Completed { eligible, has_collection, airdropped, already_claimed, tx_id } => {
                Self::Completed { identity, eligible, has_collection, airdropped, already_claimed, tx_id }
            }
            ReconcileOutcome::Failed { error, error_kind } => Self::Failed { identity, error, error_kind },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResponse {
    pub identity: String,
    pub journey: IdentityJourney,
    pub fully_complete: bool,
    pub slacker_complete: bool,
    pub overachiever_complete: bool,
    pub airdropped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<TransactionId>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// Map the error taxonomy onto HTTP statuses: boundary rejections are the
/// caller's fault, transient/unknown outcomes invite a retry, everything else
/// is ours.
pub fn error_response(err: &QuestDropError) -> Response {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Transient | ErrorKind::Retryable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::AlreadyClaimed => StatusCode::CONFLICT,
        ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: err.to_string(), kind: err.kind().as_str().to_string() })).into_response()
}
