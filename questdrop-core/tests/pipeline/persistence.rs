use crate::fixtures::{identity, test_config};
use questdrop_core::application::{sync_objective, PipelineContext};
use questdrop_core::domain::ObjectiveCode;
use questdrop_core::infrastructure::ledger::MockLedgerClient;
use questdrop_core::infrastructure::state::RocksStateStore;
use questdrop_core::infrastructure::store::MemoryObjectiveStore;
use std::sync::Arc;
use tempfile::TempDir;

/// The idempotency guarantee must hold across process restarts: a pair synced
/// before shutdown stays cached after the durable state store reopens.
#[tokio::test]
async fn sync_state_survives_state_store_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(MemoryObjectiveStore::new());
    let ledger = Arc::new(MockLedgerClient::new());
    let config = test_config();
    let id = identity(40);

    let tx = {
        let state = Arc::new(RocksStateStore::open_in_dir(dir.path()).expect("open"));
        let ctx = PipelineContext::new(store.clone(), ledger.clone(), state, &config);
        sync_objective(&ctx, &id, ObjectiveCode::Slacker).await.expect("sync").tx_id.expect("tx id")
    };
    assert_eq!(ledger.mutation_count(), 1);

    let state = Arc::new(RocksStateStore::open_in_dir(dir.path()).expect("reopen"));
    let ctx = PipelineContext::new(store, ledger.clone(), state, &config);
    let outcome = sync_objective(&ctx, &id, ObjectiveCode::Slacker).await.expect("post-restart sync");
    assert!(outcome.already_synced);
    assert_eq!(outcome.tx_id, Some(tx));
    assert_eq!(ledger.mutation_count(), 1);
}
