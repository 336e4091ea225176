use crate::fixtures::{identity, pipeline, record_all_objectives};
use questdrop_core::application::reconcile;
use questdrop_core::domain::{ObjectiveCode, ReconcileOutcome};

#[tokio::test]
async fn one_failing_identity_never_aborts_the_batch() {
    let p = pipeline();
    let (a, b, c) = (identity(30), identity(31), identity(32));
    for id in [&a, &b, &c] {
        record_all_objectives(&p, id);
        p.ledger.grant_collection(id);
    }
    p.ledger.set_mutation_failure_for(&b, "gateway 503");

    let reports = reconcile(&p.ctx, Some(vec![a.clone(), b.clone(), c.clone()])).await.expect("reconcile");
    assert_eq!(reports.len(), 3);

    for report in &reports {
        match &report.outcome {
            ReconcileOutcome::Completed { airdropped, .. } => {
                assert!(report.identity == a || report.identity == c);
                assert!(*airdropped);
            }
            ReconcileOutcome::Failed { error_kind, .. } => {
                assert_eq!(report.identity, b);
                assert_eq!(error_kind, "transient");
            }
        }
    }
    // A and C: two registrations plus an issuance each; B: one failed attempt,
    // not retried within the pass.
    assert_eq!(p.ledger.mutation_count(), 7);
}

#[tokio::test]
async fn discovery_targets_only_fully_complete_identities() {
    let p = pipeline();
    let complete = identity(33);
    let partial = identity(34);
    record_all_objectives(&p, &complete);
    p.ledger.grant_collection(&complete);
    p.store.record_success(&partial, ObjectiveCode::Slacker);

    let reports = reconcile(&p.ctx, None).await.expect("reconcile");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].identity, complete);
    assert!(matches!(reports[0].outcome, ReconcileOutcome::Completed { airdropped: true, .. }));
}

#[tokio::test]
async fn explicit_partial_identity_syncs_without_airdrop() {
    let p = pipeline();
    let id = identity(35);
    p.store.record_success(&id, ObjectiveCode::Slacker);

    let reports = reconcile(&p.ctx, Some(vec![id.clone()])).await.expect("reconcile");
    assert_eq!(reports.len(), 1);
    let ReconcileOutcome::Completed { eligible, airdropped, .. } = &reports[0].outcome else {
        panic!("expected completed entry");
    };
    assert!(!*eligible);
    assert!(!*airdropped);
    // The one completed objective was still mirrored on chain.
    assert!(p.ledger.is_registered(&id, ObjectiveCode::Slacker));
    assert_eq!(p.ledger.mutation_count(), 1);
}

#[tokio::test]
async fn rerunning_reconcile_issues_no_new_mutations() {
    let p = pipeline();
    let id = identity(36);
    record_all_objectives(&p, &id);
    p.ledger.grant_collection(&id);

    reconcile(&p.ctx, None).await.expect("first pass");
    let mutations = p.ledger.mutation_count();
    assert_eq!(mutations, 3);

    let reports = reconcile(&p.ctx, None).await.expect("second pass");
    assert!(matches!(reports[0].outcome, ReconcileOutcome::Completed { airdropped: true, already_claimed: true, .. }));
    assert_eq!(p.ledger.mutation_count(), mutations);
}
