use crate::foundation::TransactionId;
use serde::{Deserialize, Serialize};

/// Persisted per-(identity, objective) sync record.
///
/// Invariant: once `synced` is true it never reverts, and at most one
/// successful ledger registration is ever issued for the key. The in-flight
/// marker is the claim half of the compare-and-set that enforces this under
/// concurrent delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub synced: bool,
    pub tx_id: Option<TransactionId>,
    /// Set while a caller holds the mutation claim; cleared on complete/release.
    pub in_flight_since_nanos: Option<u64>,
    pub last_attempt_nanos: u64,
    pub last_error: Option<String>,
}

impl SyncRecord {
    /// A previous attempt submitted a mutation whose fate is unknown (the
    /// finality wait expired). The next holder must re-query ledger state
    /// before resubmitting.
    pub fn outcome_unknown(&self) -> bool {
        !self.synced && self.last_error.is_some()
    }
}

/// Persisted per-identity airdrop eligibility record.
///
/// Invariant: `airdropped` transitions false -> true exactly once and never
/// reverts, even if a later ledger query disagrees about eligibility.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRecord {
    pub eligible: bool,
    pub has_collection: bool,
    pub airdropped: bool,
    pub tx_id: Option<TransactionId>,
    pub in_flight_since_nanos: Option<u64>,
    pub updated_at_nanos: u64,
    pub last_error: Option<String>,
}
