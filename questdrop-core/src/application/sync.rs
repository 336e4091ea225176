use super::PipelineContext;
use crate::domain::{ObjectiveCode, SyncOutcome, SyncRecord};
use crate::foundation::{now_nanos, Identity, QuestDropError, Result};
use crate::infrastructure::ledger::{retry, LedgerQuery};
use crate::infrastructure::state::ClaimOutcome;
use log::{debug, info, warn};

/// Idempotently mirror one completed objective onto the ledger.
///
/// The state-store claim is the serialization point: between `Acquired` and
/// the matching complete/release no other caller can drive this key, so at
/// most one successful registration is ever issued per (identity, objective).
/// A pair already known-synced returns the cached result with zero ledger
/// calls.
pub async fn sync_objective(ctx: &PipelineContext, identity: &Identity, code: ObjectiveCode) -> Result<SyncOutcome> {
    let prior = match ctx.state.claim_sync(identity, code, now_nanos(), ctx.claim_ttl_nanos)? {
        ClaimOutcome::AlreadyDone { tx_id } => {
            debug!("sync cached identity={} objective={}", identity, code);
            return Ok(SyncOutcome::cached(tx_id));
        }
        ClaimOutcome::InFlight => {
            return Err(QuestDropError::SyncInFlight { identity: identity.to_string(), objective: code.to_string() })
        }
        ClaimOutcome::Acquired { prior } => prior,
    };

    match drive_sync(ctx, identity, code, prior).await {
        Ok(outcome) => {
            ctx.state.complete_sync(identity, code, outcome.tx_id, now_nanos())?;
            Ok(outcome)
        }
        Err(err) => {
            warn!("sync failed identity={} objective={} kind={} err={}", identity, code, err.kind(), err);
            ctx.state.release_sync(identity, code, &err.to_string(), now_nanos())?;
            Err(err)
        }
    }
}

async fn drive_sync(
    ctx: &PipelineContext,
    identity: &Identity,
    code: ObjectiveCode,
    prior: Option<SyncRecord>,
) -> Result<SyncOutcome> {
    // A previous holder submitted a mutation whose fate is unknown. Re-query
    // the ledger's registration state before deciding whether to resubmit.
    if prior.as_ref().is_some_and(SyncRecord::outcome_unknown) {
        let registered = retry(ctx.retry_attempts, ctx.retry_delay, || {
            ctx.ledger.query(LedgerQuery::ObjectiveRegistered(code), identity)
        })
        .await?;
        if registered {
            info!("earlier submission landed identity={} objective={}", identity, code);
            return Ok(SyncOutcome::cached(None));
        }
    }

    // Mutations are never auto-retried: a transport failure mid-submit leaves
    // the outcome ambiguous, and the recovery path above handles the redo.
    let tx_id = match ctx.ledger.mutate(code.entrypoint(), identity).await {
        Ok(tx_id) => tx_id,
        Err(QuestDropError::AlreadyRegistered { .. }) => {
            info!("ledger reports already registered identity={} objective={}", identity, code);
            return Ok(SyncOutcome::cached(None));
        }
        Err(err) => return Err(err),
    };

    ctx.ledger.await_sealed(&tx_id, ctx.seal_deadline).await?;
    info!("objective registered identity={} objective={} tx_id={}", identity, code, tx_id);
    Ok(SyncOutcome::sealed(tx_id))
}
