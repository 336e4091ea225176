use crate::domain::completion::CompletionStatus;
use crate::domain::objective::ObjectiveCode;
use crate::domain::state::{EligibilityRecord, SyncRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logical per-identity state machine, derived on demand by composing the
/// off-chain completion snapshot with the persisted sync and eligibility
/// records. Transitions are monotonic; re-driving the pipeline from any stage
/// is safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityJourney {
    NotStarted,
    ObjectivesPartial,
    ObjectivesComplete,
    SyncedOnChain,
    EligibleForAirdrop,
    CollectionReady,
    Airdropped,
}

impl IdentityJourney {
    pub fn derive(
        completion: &CompletionStatus,
        sync: &BTreeMap<ObjectiveCode, SyncRecord>,
        eligibility: Option<&EligibilityRecord>,
    ) -> Self {
        if let Some(record) = eligibility {
            if record.airdropped {
                return Self::Airdropped;
            }
            if record.eligible && record.has_collection {
                return Self::CollectionReady;
            }
            if record.eligible {
                return Self::EligibleForAirdrop;
            }
        }

        let all_synced =
            ObjectiveCode::REQUIRED.iter().all(|code| sync.get(code).map(|record| record.synced).unwrap_or(false));
        if all_synced {
            return Self::SyncedOnChain;
        }

        if completion.fully_complete() {
            return Self::ObjectivesComplete;
        }
        if completion.completed_count() > 0 {
            return Self::ObjectivesPartial;
        }
        Self::NotStarted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::TransactionId;

    fn completion(slacker: bool, overachiever: bool) -> CompletionStatus {
        let mut map = BTreeMap::new();
        map.insert(ObjectiveCode::Slacker, slacker);
        map.insert(ObjectiveCode::Overachiever, overachiever);
        CompletionStatus::new(map)
    }

    fn synced_record() -> SyncRecord {
        SyncRecord { synced: true, tx_id: Some(TransactionId::new([1; 32])), ..SyncRecord::default() }
    }

    #[test]
    fn journey_is_monotonic_over_the_pipeline() {
        let empty_sync = BTreeMap::new();
        let mut stages = Vec::new();

        stages.push(IdentityJourney::derive(&completion(false, false), &empty_sync, None));
        stages.push(IdentityJourney::derive(&completion(true, false), &empty_sync, None));
        stages.push(IdentityJourney::derive(&completion(true, true), &empty_sync, None));

        let mut all_synced = BTreeMap::new();
        all_synced.insert(ObjectiveCode::Slacker, synced_record());
        all_synced.insert(ObjectiveCode::Overachiever, synced_record());
        stages.push(IdentityJourney::derive(&completion(true, true), &all_synced, None));

        let eligible = EligibilityRecord { eligible: true, ..EligibilityRecord::default() };
        stages.push(IdentityJourney::derive(&completion(true, true), &all_synced, Some(&eligible)));

        let ready = EligibilityRecord { eligible: true, has_collection: true, ..EligibilityRecord::default() };
        stages.push(IdentityJourney::derive(&completion(true, true), &all_synced, Some(&ready)));

        let done = EligibilityRecord {
            eligible: true,
            has_collection: true,
            airdropped: true,
            tx_id: Some(TransactionId::new([2; 32])),
            ..EligibilityRecord::default()
        };
        stages.push(IdentityJourney::derive(&completion(true, true), &all_synced, Some(&done)));

        assert_eq!(
            stages,
            vec![
                IdentityJourney::NotStarted,
                IdentityJourney::ObjectivesPartial,
                IdentityJourney::ObjectivesComplete,
                IdentityJourney::SyncedOnChain,
                IdentityJourney::EligibleForAirdrop,
                IdentityJourney::CollectionReady,
                IdentityJourney::Airdropped,
            ]
        );
        assert!(stages.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn airdropped_wins_even_if_eligibility_flag_later_disagrees() {
        let record = EligibilityRecord { eligible: false, airdropped: true, ..EligibilityRecord::default() };
        let journey = IdentityJourney::derive(&completion(false, false), &BTreeMap::new(), Some(&record));
        assert_eq!(journey, IdentityJourney::Airdropped);
    }

    #[test]
    fn partial_sync_does_not_count_as_synced() {
        let mut partial = BTreeMap::new();
        partial.insert(ObjectiveCode::Slacker, synced_record());
        let journey = IdentityJourney::derive(&completion(true, true), &partial, None);
        assert_eq!(journey, IdentityJourney::ObjectivesComplete);
    }
}
