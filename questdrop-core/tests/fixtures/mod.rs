#![allow(dead_code)]

use questdrop_core::application::PipelineContext;
use questdrop_core::domain::ObjectiveCode;
use questdrop_core::foundation::Identity;
use questdrop_core::infrastructure::config::ServiceConfig;
use questdrop_core::infrastructure::ledger::MockLedgerClient;
use questdrop_core::infrastructure::state::MemoryStateStore;
use questdrop_core::infrastructure::store::MemoryObjectiveStore;
use std::sync::Arc;

/// Full in-memory pipeline plus handles to each mock so tests can script
/// failures and assert on call counts.
pub struct TestPipeline {
    pub store: Arc<MemoryObjectiveStore>,
    pub ledger: Arc<MockLedgerClient>,
    pub state: Arc<MemoryStateStore>,
    pub ctx: PipelineContext,
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        seal_deadline_secs: 1,
        claim_ttl_secs: 60,
        retry_attempts: 1,
        retry_delay_ms: 1,
        reconcile_max_in_flight: 4,
        ..ServiceConfig::default()
    }
}

pub fn pipeline() -> TestPipeline {
    pipeline_with_config(test_config())
}

pub fn pipeline_with_config(config: ServiceConfig) -> TestPipeline {
    let store = Arc::new(MemoryObjectiveStore::new());
    let ledger = Arc::new(MockLedgerClient::new());
    let state = Arc::new(MemoryStateStore::new());
    let ctx = PipelineContext::new(store.clone(), ledger.clone(), state.clone(), &config);
    TestPipeline { store, ledger, state, ctx }
}

pub fn identity(n: u64) -> Identity {
    Identity::parse(&format!("0x{n:016x}")).expect("test identity")
}

/// Record off-chain success for every required objective.
pub fn record_all_objectives(pipeline: &TestPipeline, identity: &Identity) {
    for code in ObjectiveCode::REQUIRED {
        pipeline.store.record_success(identity, *code);
    }
}
