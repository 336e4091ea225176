use crate::fixtures::{identity, pipeline};
use questdrop_core::application::evaluate_and_airdrop;
use questdrop_core::domain::LedgerEntrypoint;
use questdrop_core::infrastructure::ledger::LedgerClient;
use questdrop_core::infrastructure::state::StateStore;

#[tokio::test]
async fn ineligible_identity_short_circuits_before_issuance() {
    let p = pipeline();
    let id = identity(10);

    let result = evaluate_and_airdrop(&p.ctx, &id).await.expect("evaluate");
    assert!(!result.eligible);
    assert!(!result.airdropped);
    assert_eq!(p.ledger.mutation_count(), 0);
    assert_eq!(p.ledger.query_count(), 1, "collection check must be skipped");
}

#[tokio::test]
async fn missing_collection_capability_blocks_issuance() {
    let p = pipeline();
    let id = identity(11);
    p.ledger.mutate(LedgerEntrypoint::RegisterSlacker, &id).await.expect("register");
    p.ledger.mutate(LedgerEntrypoint::RegisterOverachiever, &id).await.expect("register");

    let result = evaluate_and_airdrop(&p.ctx, &id).await.expect("evaluate");
    assert!(result.eligible);
    assert!(!result.has_collection);
    assert!(!result.airdropped);
    assert_eq!(p.ledger.mutation_count(), 2, "no issuance without the capability");
}

#[tokio::test]
async fn airdrop_issues_exactly_once() {
    let p = pipeline();
    let id = identity(12);
    p.ledger.mutate(LedgerEntrypoint::RegisterSlacker, &id).await.expect("register");
    p.ledger.mutate(LedgerEntrypoint::RegisterOverachiever, &id).await.expect("register");
    p.ledger.grant_collection(&id);

    let first = evaluate_and_airdrop(&p.ctx, &id).await.expect("first evaluate");
    assert!(first.airdropped);
    assert!(!first.already_claimed);
    let tx = first.tx_id.expect("transaction id");
    assert_eq!(p.ledger.mutation_count(), 3);

    let second = evaluate_and_airdrop(&p.ctx, &id).await.expect("second evaluate");
    assert!(second.airdropped);
    assert!(second.already_claimed);
    assert_eq!(second.tx_id, Some(tx));
    assert_eq!(p.ledger.mutation_count(), 3, "no second issuance");
}

#[tokio::test]
async fn ledger_duplicate_issuance_maps_to_claimed_outcome() {
    let p = pipeline();
    let id = identity(13);
    p.ledger.mutate(LedgerEntrypoint::RegisterSlacker, &id).await.expect("register");
    p.ledger.mutate(LedgerEntrypoint::RegisterOverachiever, &id).await.expect("register");
    p.ledger.grant_collection(&id);
    // Airdropped out-of-band; our eligibility record knows nothing about it.
    p.ledger.mutate(LedgerEntrypoint::IssueAirdrop, &id).await.expect("out-of-band issuance");

    let result = evaluate_and_airdrop(&p.ctx, &id).await.expect("evaluate");
    assert!(result.airdropped);
    assert!(result.already_claimed);

    // The rejection was persisted: the next call never reaches the ledger.
    let queries_before = p.ledger.query_count();
    let cached = evaluate_and_airdrop(&p.ctx, &id).await.expect("cached evaluate");
    assert!(cached.already_claimed);
    assert_eq!(p.ledger.query_count(), queries_before);

    let record = p.state.get_eligibility(&id).expect("get").expect("record");
    assert!(record.airdropped);
}
