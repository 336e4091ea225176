use super::PipelineContext;
use crate::domain::{CompletionStatus, ObjectiveCode};
use crate::foundation::{Identity, Result};
use crate::infrastructure::ledger::retry;
use log::debug;
use std::collections::BTreeMap;

/// Derive the identity's completion snapshot from the off-chain store.
///
/// A missing record reads as "not complete"; only store unreachability is an
/// error, and it propagates unchanged (no partial snapshot is ever returned).
pub async fn check_completion(ctx: &PipelineContext, identity: &Identity) -> Result<CompletionStatus> {
    let mut completed = BTreeMap::new();
    for code in ObjectiveCode::REQUIRED {
        let done = retry(ctx.retry_attempts, ctx.retry_delay, || ctx.store.get_success(identity, *code)).await?;
        completed.insert(*code, done);
    }
    let status = CompletionStatus::new(completed);
    debug!(
        "completion identity={} completed={}/{} fully_complete={}",
        identity,
        status.completed_count(),
        ObjectiveCode::REQUIRED.len(),
        status.fully_complete()
    );
    Ok(status)
}
