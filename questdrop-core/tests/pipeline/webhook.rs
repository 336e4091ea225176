use crate::fixtures::{identity, pipeline};
use questdrop_core::application::handle_objective_event;
use questdrop_core::domain::{HandlerResult, ObjectiveCode};
use questdrop_core::foundation::ErrorKind;

#[tokio::test]
async fn unrecognized_code_is_a_noop_with_zero_collaborator_calls() {
    let p = pipeline();
    let id = identity(20);

    let result = handle_objective_event(&p.ctx, id.as_str(), "UNKNOWN").await.expect("handle");
    assert!(matches!(result, HandlerResult::Unrecognized { ref code } if code == "UNKNOWN"));
    assert_eq!(p.store.query_count(), 0);
    assert_eq!(p.ledger.query_count(), 0);
    assert_eq!(p.ledger.mutation_count(), 0);
}

#[tokio::test]
async fn malformed_identity_is_rejected_before_any_call() {
    let p = pipeline();

    let err = handle_objective_event(&p.ctx, "not-an-address", "SLACKER").await.expect_err("validation");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(p.store.query_count(), 0);
    assert_eq!(p.ledger.query_count(), 0);
    assert_eq!(p.ledger.mutation_count(), 0);
}

#[tokio::test]
async fn partial_completion_syncs_but_never_evaluates_airdrop() {
    let p = pipeline();
    let id = identity(21);
    p.store.record_success(&id, ObjectiveCode::Slacker);

    let result = handle_objective_event(&p.ctx, id.as_str(), "SLACKER").await.expect("handle");
    let HandlerResult::Processed { objective, sync, completion, airdrop } = result else {
        panic!("expected processed result");
    };
    assert_eq!(objective, ObjectiveCode::Slacker);
    assert!(!sync.already_synced);
    assert!(completion.is_complete(ObjectiveCode::Slacker));
    assert!(!completion.is_complete(ObjectiveCode::Overachiever));
    assert!(!completion.fully_complete());
    assert!(airdrop.is_none());
    assert_eq!(p.ledger.mutation_count(), 1);
    assert_eq!(p.ledger.query_count(), 0, "decision engine must not run");
}

#[tokio::test]
async fn final_objective_event_drives_through_to_airdrop() {
    let p = pipeline();
    let id = identity(22);
    p.ledger.grant_collection(&id);

    p.store.record_success(&id, ObjectiveCode::Slacker);
    let first = handle_objective_event(&p.ctx, id.as_str(), "SLACKER").await.expect("first event");
    assert!(matches!(first, HandlerResult::Processed { airdrop: None, .. }));

    // The overachiever objective still arrives under its legacy wire code.
    p.store.record_success(&id, ObjectiveCode::Overachiever);
    let second = handle_objective_event(&p.ctx, id.as_str(), "CGAF").await.expect("second event");
    let HandlerResult::Processed { objective, completion, airdrop, .. } = second else {
        panic!("expected processed result");
    };
    assert_eq!(objective, ObjectiveCode::Overachiever);
    assert!(completion.fully_complete());
    let airdrop = airdrop.expect("airdrop decision ran");
    assert!(airdrop.airdropped);
    assert!(airdrop.tx_id.is_some());
    // Two registrations plus one issuance.
    assert_eq!(p.ledger.mutation_count(), 3);
}

#[tokio::test]
async fn duplicate_delivery_of_same_event_is_idempotent() {
    let p = pipeline();
    let id = identity(23);
    p.store.record_success(&id, ObjectiveCode::Slacker);

    handle_objective_event(&p.ctx, id.as_str(), "SLACKER").await.expect("first delivery");
    let redelivered = handle_objective_event(&p.ctx, id.as_str(), "SLACKER").await.expect("redelivery");

    let HandlerResult::Processed { sync, .. } = redelivered else {
        panic!("expected processed result");
    };
    assert!(sync.already_synced);
    assert_eq!(p.ledger.mutation_count(), 1);
}
