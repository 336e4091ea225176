mod memory;
mod rocks;

pub use memory::MemoryStateStore;
pub use rocks::RocksStateStore;

use crate::domain::{EligibilityRecord, ObjectiveCode, SyncRecord};
use crate::foundation::{Identity, Result, TransactionId};
use std::collections::BTreeMap;

/// Result of a compare-and-set claim on a mutation key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now holds the key and must finish with `complete_*` or
    /// `release_*`. Carries the prior record so the holder can see whether an
    /// earlier attempt left the outcome unknown.
    Acquired { prior: Option<SyncRecord> },
    /// The mutation already succeeded; no ledger call may be issued.
    AlreadyDone { tx_id: Option<TransactionId> },
    /// Another caller holds an unexpired claim.
    InFlight,
}

/// Persistence boundary for SyncState and EligibilityState.
///
/// The claim methods are the serialization point of the whole design: for any
/// key, between `Acquired` and the matching `complete`/`release` no other
/// caller can acquire, so the check-then-mutate sequence against the ledger is
/// single-writer per key. Claims expire after `ttl_nanos` to survive crashed
/// holders.
pub trait StateStore: Send + Sync {
    fn claim_sync(
        &self,
        identity: &Identity,
        code: ObjectiveCode,
        now_nanos: u64,
        ttl_nanos: u64,
    ) -> Result<ClaimOutcome>;
    fn complete_sync(
        &self,
        identity: &Identity,
        code: ObjectiveCode,
        tx_id: Option<TransactionId>,
        now_nanos: u64,
    ) -> Result<()>;
    fn release_sync(&self, identity: &Identity, code: ObjectiveCode, error: &str, now_nanos: u64) -> Result<()>;
    fn get_sync(&self, identity: &Identity, code: ObjectiveCode) -> Result<Option<SyncRecord>>;

    fn claim_airdrop(&self, identity: &Identity, now_nanos: u64, ttl_nanos: u64) -> Result<ClaimOutcome>;
    fn complete_airdrop(&self, identity: &Identity, tx_id: Option<TransactionId>, now_nanos: u64) -> Result<()>;
    fn release_airdrop(&self, identity: &Identity, error: &str, now_nanos: u64) -> Result<()>;

    fn get_eligibility(&self, identity: &Identity) -> Result<Option<EligibilityRecord>>;
    /// Record the latest ledger-side eligibility observation. Must never
    /// revert `airdropped` or drop a stored transaction id.
    fn record_eligibility(&self, identity: &Identity, eligible: bool, has_collection: bool, now_nanos: u64)
        -> Result<()>;

    /// All sync records for one identity, keyed by objective. Feeds journey
    /// derivation.
    fn sync_records_for(&self, identity: &Identity) -> Result<BTreeMap<ObjectiveCode, SyncRecord>> {
        let mut out = BTreeMap::new();
        for code in ObjectiveCode::REQUIRED {
            if let Some(record) = self.get_sync(identity, *code)? {
                out.insert(*code, record);
            }
        }
        Ok(out)
    }

    fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Shared claim arithmetic: a claim is live while its timestamp is within ttl.
pub(crate) fn claim_live(in_flight_since_nanos: Option<u64>, now_nanos: u64, ttl_nanos: u64) -> bool {
    match in_flight_since_nanos {
        Some(since) => now_nanos.saturating_sub(since) < ttl_nanos,
        None => false,
    }
}
