use crate::domain::completion::CompletionStatus;
use crate::domain::objective::ObjectiveCode;
use crate::foundation::{ErrorKind, Identity, TransactionId};
use serde::{Deserialize, Serialize};

/// Outcome of one idempotent sync drive for an (identity, objective) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Registration transaction, when known. `None` when the ledger reported
    /// the pair already registered before we ever observed a transaction id.
    pub tx_id: Option<TransactionId>,
    /// True when no new ledger mutation was issued by this call.
    pub already_synced: bool,
}

impl SyncOutcome {
    pub fn sealed(tx_id: TransactionId) -> Self {
        Self { tx_id: Some(tx_id), already_synced: false }
    }

    pub fn cached(tx_id: Option<TransactionId>) -> Self {
        Self { tx_id, already_synced: true }
    }
}

/// Outcome of the three-stage airdrop decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropResult {
    pub eligible: bool,
    pub has_collection: bool,
    pub airdropped: bool,
    /// True when the reward was issued by an earlier call (ours or another
    /// trigger's); `tx_id` then carries the original transaction when known.
    pub already_claimed: bool,
    pub tx_id: Option<TransactionId>,
}

impl AirdropResult {
    pub fn not_eligible() -> Self {
        Self::default()
    }

    pub fn awaiting_collection() -> Self {
        Self { eligible: true, ..Self::default() }
    }

    pub fn issued(tx_id: TransactionId) -> Self {
        Self { eligible: true, has_collection: true, airdropped: true, already_claimed: false, tx_id: Some(tx_id) }
    }

    pub fn claimed_earlier(tx_id: Option<TransactionId>) -> Self {
        Self { eligible: true, has_collection: true, airdropped: true, already_claimed: true, tx_id }
    }
}

/// Structured result of one webhook delivery. Business states ("not yet
/// complete", "already claimed", "not our code") are values here, never errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// The event carried a code outside the objective registry. No side effects.
    Unrecognized { code: String },
    Processed {
        objective: ObjectiveCode,
        sync: SyncOutcome,
        completion: CompletionStatus,
        /// Present only when the off-chain record set was fully complete.
        airdrop: Option<AirdropResult>,
    },
}

/// Per-identity entry in a bulk reconcile pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityReport {
    pub identity: Identity,
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReconcileOutcome {
    Completed {
        eligible: bool,
        has_collection: bool,
        airdropped: bool,
        already_claimed: bool,
        tx_id: Option<TransactionId>,
    },
    Failed {
        error: String,
        error_kind: String,
    },
}

impl ReconcileOutcome {
    pub fn completed(result: &AirdropResult) -> Self {
        Self::Completed {
            eligible: result.eligible,
            has_collection: result.has_collection,
            airdropped: result.airdropped,
            already_claimed: result.already_claimed,
            tx_id: result.tx_id,
        }
    }

    pub fn failed(error: impl std::fmt::Display, kind: ErrorKind) -> Self {
        Self::Failed { error: error.to_string(), error_kind: kind.as_str().to_string() }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
