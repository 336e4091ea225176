//! Orchestration pipeline: completion evaluation, idempotent ledger sync, the
//! airdrop decision engine, the webhook entry point, and bulk reconciliation.
//! All components operate over one [`PipelineContext`] of shared collaborators
//! constructed at process start.

mod airdrop;
mod evaluator;
mod reconcile;
mod sync;
mod webhook;

pub use airdrop::evaluate_and_airdrop;
pub use evaluator::check_completion;
pub use reconcile::reconcile;
pub use sync::sync_objective;
pub use webhook::handle_objective_event;

use crate::foundation::secs_to_nanos;
use crate::infrastructure::config::ServiceConfig;
use crate::infrastructure::ledger::LedgerClient;
use crate::infrastructure::state::StateStore;
use crate::infrastructure::store::ObjectiveStore;
use std::sync::Arc;
use std::time::Duration;

/// Shared collaborators plus the timing/concurrency knobs every pipeline
/// operation needs. Cheap to clone; construct once at startup and hand out.
#[derive(Clone)]
pub struct PipelineContext {
    pub store: Arc<dyn ObjectiveStore>,
    pub ledger: Arc<dyn LedgerClient>,
    pub state: Arc<dyn StateStore>,
    /// Finality wait per ledger mutation.
    pub seal_deadline: Duration,
    /// How long an in-flight mutation claim stays exclusive.
    pub claim_ttl_nanos: u64,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
    pub reconcile_max_in_flight: usize,
}

impl PipelineContext {
    pub fn new(
        store: Arc<dyn ObjectiveStore>,
        ledger: Arc<dyn LedgerClient>,
        state: Arc<dyn StateStore>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            state,
            seal_deadline: config.seal_deadline(),
            claim_ttl_nanos: secs_to_nanos(config.claim_ttl_secs),
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay(),
            reconcile_max_in_flight: config.reconcile_max_in_flight,
        }
    }
}
