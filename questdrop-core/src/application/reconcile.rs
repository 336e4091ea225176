use super::{check_completion, evaluate_and_airdrop, sync_objective, PipelineContext};
use crate::domain::{AirdropResult, IdentityReport, ObjectiveCode, ReconcileOutcome};
use crate::foundation::{Identity, Result};
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

/// Batch re-drive of the pipeline across many identities.
///
/// With no explicit list, targets come from store-side discovery of
/// fully-complete identities. Each identity runs in isolation: its error is
/// captured into its own report entry and never aborts the batch. In-flight
/// work against the ledger is capped so a backfill cannot starve the
/// real-time webhook path.
pub async fn reconcile(ctx: &PipelineContext, identities: Option<Vec<Identity>>) -> Result<Vec<IdentityReport>> {
    let targets = match identities {
        Some(list) => list,
        None => ctx.store.fully_complete_identities().await?,
    };
    info!("reconcile starting identities={} max_in_flight={}", targets.len(), ctx.reconcile_max_in_flight);

    let mut reports: Vec<IdentityReport> = stream::iter(targets)
        .map(|identity| async move {
            let outcome = match reconcile_identity(ctx, &identity).await {
                Ok(result) => ReconcileOutcome::completed(&result),
                Err(err) => {
                    warn!("reconcile entry failed identity={} kind={} err={}", identity, err.kind(), err);
                    ReconcileOutcome::failed(&err, err.kind())
                }
            };
            IdentityReport { identity, outcome }
        })
        .buffer_unordered(ctx.reconcile_max_in_flight.max(1))
        .collect()
        .await;

    reports.sort_by(|a, b| a.identity.cmp(&b.identity));
    let failed = reports.iter().filter(|report| report.outcome.is_failed()).count();
    info!("reconcile finished identities={} failed={}", reports.len(), failed);
    Ok(reports)
}

/// One identity's pass: sync every objective the store shows complete, then
/// run the airdrop decision only when the whole required set is complete.
/// Never the unconditional resubmission of both registrations; the idempotent
/// orchestrator decides per key.
async fn reconcile_identity(ctx: &PipelineContext, identity: &Identity) -> Result<AirdropResult> {
    let completion = check_completion(ctx, identity).await?;
    for code in ObjectiveCode::REQUIRED {
        if completion.is_complete(*code) {
            sync_objective(ctx, identity, *code).await?;
        }
    }
    if !completion.fully_complete() {
        return Ok(AirdropResult::not_eligible());
    }
    evaluate_and_airdrop(ctx, identity).await
}
