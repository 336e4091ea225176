use super::{claim_live, ClaimOutcome, StateStore};
use crate::domain::{EligibilityRecord, ObjectiveCode, SyncRecord};
use crate::foundation::{Identity, QuestDropError, Result, TransactionId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryInner {
    sync: HashMap<(Identity, ObjectiveCode), SyncRecord>,
    eligibility: HashMap<Identity, EligibilityRecord>,
}

/// In-memory state store. The single mutex makes every claim a true
/// compare-and-set; used by tests and by local tooling that does not need
/// durability.
pub struct MemoryStateStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(MemoryInner::default()) }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        self.inner.lock().map_err(|_| QuestDropError::StorageError {
            operation: "memory state lock".to_string(),
            details: "poisoned".to_string(),
        })
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStateStore {
    fn claim_sync(&self, identity: &Identity, code: ObjectiveCode, now_nanos: u64, ttl_nanos: u64) -> Result<ClaimOutcome> {
        let mut inner = self.lock_inner()?;
        let key = (identity.clone(), code);
        let record = inner.sync.entry(key).or_default();
        if record.synced {
            return Ok(ClaimOutcome::AlreadyDone { tx_id: record.tx_id });
        }
        if claim_live(record.in_flight_since_nanos, now_nanos, ttl_nanos) {
            return Ok(ClaimOutcome::InFlight);
        }
        let prior = if record.last_attempt_nanos > 0 { Some(record.clone()) } else { None };
        record.in_flight_since_nanos = Some(now_nanos);
        record.last_attempt_nanos = now_nanos;
        Ok(ClaimOutcome::Acquired { prior })
    }

    fn complete_sync(&self, identity: &Identity, code: ObjectiveCode, tx_id: Option<TransactionId>, now_nanos: u64) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let record = inner.sync.entry((identity.clone(), code)).or_default();
        record.synced = true;
        record.tx_id = tx_id.or(record.tx_id);
        record.in_flight_since_nanos = None;
        record.last_attempt_nanos = now_nanos;
        record.last_error = None;
        Ok(())
    }

    fn release_sync(&self, identity: &Identity, code: ObjectiveCode, error: &str, now_nanos: u64) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let record = inner.sync.entry((identity.clone(), code)).or_default();
        record.in_flight_since_nanos = None;
        record.last_attempt_nanos = now_nanos;
        record.last_error = Some(error.to_string());
        Ok(())
    }

    fn get_sync(&self, identity: &Identity, code: ObjectiveCode) -> Result<Option<SyncRecord>> {
        Ok(self.lock_inner()?.sync.get(&(identity.clone(), code)).cloned())
    }

    fn claim_airdrop(&self, identity: &Identity, now_nanos: u64, ttl_nanos: u64) -> Result<ClaimOutcome> {
        let mut inner = self.lock_inner()?;
        let record = inner.eligibility.entry(identity.clone()).or_default();
        if record.airdropped {
            return Ok(ClaimOutcome::AlreadyDone { tx_id: record.tx_id });
        }
        if claim_live(record.in_flight_since_nanos, now_nanos, ttl_nanos) {
            return Ok(ClaimOutcome::InFlight);
        }
        record.in_flight_since_nanos = Some(now_nanos);
        record.updated_at_nanos = now_nanos;
        Ok(ClaimOutcome::Acquired { prior: None })
    }

    fn complete_airdrop(&self, identity: &Identity, tx_id: Option<TransactionId>, now_nanos: u64) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let record = inner.eligibility.entry(identity.clone()).or_default();
        record.airdropped = true;
        record.tx_id = tx_id.or(record.tx_id);
        record.in_flight_since_nanos = None;
        record.updated_at_nanos = now_nanos;
        record.last_error = None;
        Ok(())
    }

    fn release_airdrop(&self, identity: &Identity, error: &str, now_nanos: u64) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let record = inner.eligibility.entry(identity.clone()).or_default();
        record.in_flight_since_nanos = None;
        record.updated_at_nanos = now_nanos;
        record.last_error = Some(error.to_string());
        Ok(())
    }

    fn get_eligibility(&self, identity: &Identity) -> Result<Option<EligibilityRecord>> {
        Ok(self.lock_inner()?.eligibility.get(identity).cloned())
    }

    fn record_eligibility(&self, identity: &Identity, eligible: bool, has_collection: bool, now_nanos: u64) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let record = inner.eligibility.entry(identity.clone()).or_default();
        record.eligible = eligible;
        record.has_collection = has_collection;
        record.updated_at_nanos = now_nanos;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::parse("0x0123456789abcdef").expect("identity")
    }

    const TTL: u64 = 1_000;

    #[test]
    fn claim_is_exclusive_until_released() {
        let store = MemoryStateStore::new();
        let id = identity();

        let first = store.claim_sync(&id, ObjectiveCode::Slacker, 10, TTL).expect("claim");
        assert!(matches!(first, ClaimOutcome::Acquired { prior: None }));

        let second = store.claim_sync(&id, ObjectiveCode::Slacker, 20, TTL).expect("claim");
        assert_eq!(second, ClaimOutcome::InFlight);

        store.release_sync(&id, ObjectiveCode::Slacker, "gateway down", 30).expect("release");
        let third = store.claim_sync(&id, ObjectiveCode::Slacker, 40, TTL).expect("claim");
        match third {
            ClaimOutcome::Acquired { prior: Some(prior) } => {
                assert!(prior.outcome_unknown());
                assert_eq!(prior.last_error.as_deref(), Some("gateway down"));
            }
            other => panic!("expected acquired with prior, got {other:?}"),
        }
    }

    #[test]
    fn expired_claim_is_reclaimable() {
        let store = MemoryStateStore::new();
        let id = identity();
        store.claim_sync(&id, ObjectiveCode::Slacker, 0, TTL).expect("claim");
        let outcome = store.claim_sync(&id, ObjectiveCode::Slacker, TTL + 1, TTL).expect("claim");
        assert!(matches!(outcome, ClaimOutcome::Acquired { .. }));
    }

    #[test]
    fn completed_sync_never_reclaims() {
        let store = MemoryStateStore::new();
        let id = identity();
        store.claim_sync(&id, ObjectiveCode::Overachiever, 0, TTL).expect("claim");
        let tx = TransactionId::new([5; 32]);
        store.complete_sync(&id, ObjectiveCode::Overachiever, Some(tx), 1).expect("complete");

        let outcome = store.claim_sync(&id, ObjectiveCode::Overachiever, 2, TTL).expect("claim");
        assert_eq!(outcome, ClaimOutcome::AlreadyDone { tx_id: Some(tx) });
    }

    #[test]
    fn record_eligibility_does_not_revert_airdropped() {
        let store = MemoryStateStore::new();
        let id = identity();
        let tx = TransactionId::new([9; 32]);
        store.complete_airdrop(&id, Some(tx), 1).expect("complete");
        store.record_eligibility(&id, false, false, 2).expect("record");

        let record = store.get_eligibility(&id).expect("get").expect("present");
        assert!(record.airdropped);
        assert_eq!(record.tx_id, Some(tx));
    }
}
