use crate::fixtures::{identity, pipeline};
use questdrop_core::application::sync_objective;
use questdrop_core::domain::{LedgerEntrypoint, ObjectiveCode};
use questdrop_core::foundation::{now_nanos, ErrorKind};
use questdrop_core::infrastructure::ledger::LedgerClient;
use questdrop_core::infrastructure::state::StateStore;

#[tokio::test]
async fn second_sync_is_cached_with_zero_ledger_calls() {
    let p = pipeline();
    let id = identity(1);

    let first = sync_objective(&p.ctx, &id, ObjectiveCode::Slacker).await.expect("first sync");
    assert!(!first.already_synced);
    let tx = first.tx_id.expect("transaction id");
    assert_eq!(p.ledger.mutation_count(), 1);

    let second = sync_objective(&p.ctx, &id, ObjectiveCode::Slacker).await.expect("second sync");
    assert!(second.already_synced);
    assert_eq!(second.tx_id, Some(tx));
    assert_eq!(p.ledger.mutation_count(), 1);
    assert_eq!(p.ledger.query_count(), 0);
}

#[tokio::test]
async fn ledger_duplicate_rejection_is_noop_success() {
    let p = pipeline();
    let id = identity(2);
    // Registered out-of-band; our state store has never seen the pair.
    p.ledger.mutate(LedgerEntrypoint::RegisterSlacker, &id).await.expect("out-of-band registration");

    let outcome = sync_objective(&p.ctx, &id, ObjectiveCode::Slacker).await.expect("sync");
    assert!(outcome.already_synced);
    assert_eq!(outcome.tx_id, None);

    // The rejection was persisted as synced: the next call is fully cached.
    let cached = sync_objective(&p.ctx, &id, ObjectiveCode::Slacker).await.expect("cached sync");
    assert!(cached.already_synced);
    assert_eq!(p.ledger.mutation_count(), 2);
}

#[tokio::test]
async fn seal_timeout_recovers_by_requery_not_resubmission() {
    let p = pipeline();
    let id = identity(3);
    p.ledger.hold_next_seal();

    let err = sync_objective(&p.ctx, &id, ObjectiveCode::Overachiever).await.expect_err("deadline expiry");
    assert_eq!(err.kind(), ErrorKind::Retryable);
    assert_eq!(p.ledger.mutation_count(), 1);
    // The submission actually landed even though we never saw the seal.
    assert!(p.ledger.is_registered(&id, ObjectiveCode::Overachiever));

    let record = p.state.get_sync(&id, ObjectiveCode::Overachiever).expect("get").expect("record");
    assert!(record.outcome_unknown());

    let outcome = sync_objective(&p.ctx, &id, ObjectiveCode::Overachiever).await.expect("recovery drive");
    assert!(outcome.already_synced);
    assert_eq!(p.ledger.mutation_count(), 1, "recovery must re-query, never resubmit");
    assert_eq!(p.ledger.query_count(), 1);
}

#[tokio::test]
async fn concurrent_claim_holder_blocks_second_caller() {
    let p = pipeline();
    let id = identity(4);
    // Another caller holds the claim for this key.
    p.state
        .claim_sync(&id, ObjectiveCode::Slacker, now_nanos(), p.ctx.claim_ttl_nanos)
        .expect("external claim");

    let err = sync_objective(&p.ctx, &id, ObjectiveCode::Slacker).await.expect_err("in-flight");
    assert_eq!(err.kind(), ErrorKind::Retryable);
    assert_eq!(p.ledger.mutation_count(), 0);
}
