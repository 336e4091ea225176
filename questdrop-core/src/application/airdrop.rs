use super::PipelineContext;
use crate::domain::{AirdropResult, LedgerEntrypoint};
use crate::foundation::{now_nanos, Identity, QuestDropError, Result};
use crate::infrastructure::ledger::{retry, LedgerQuery};
use crate::infrastructure::state::ClaimOutcome;
use log::{debug, info, warn};

/// Three-stage, short-circuiting airdrop decision: aggregate eligibility,
/// collection capability, then the one-time issuance. Each stage that fails
/// returns a structured non-error result; only infrastructure failures
/// propagate as errors.
pub async fn evaluate_and_airdrop(ctx: &PipelineContext, identity: &Identity) -> Result<AirdropResult> {
    // Issuance already recorded: report it without touching the ledger.
    if let Some(record) = ctx.state.get_eligibility(identity)? {
        if record.airdropped {
            debug!("airdrop cached identity={} tx_id={:?}", identity, record.tx_id);
            return Ok(AirdropResult::claimed_earlier(record.tx_id));
        }
    }

    let eligible =
        retry(ctx.retry_attempts, ctx.retry_delay, || ctx.ledger.query(LedgerQuery::AirdropEligibility, identity)).await?;
    if !eligible {
        ctx.state.record_eligibility(identity, false, false, now_nanos())?;
        debug!("not eligible identity={}", identity);
        return Ok(AirdropResult::not_eligible());
    }

    let has_collection =
        retry(ctx.retry_attempts, ctx.retry_delay, || ctx.ledger.query(LedgerQuery::CollectionCapability, identity)).await?;
    ctx.state.record_eligibility(identity, true, has_collection, now_nanos())?;
    if !has_collection {
        info!("eligible but no collection capability identity={}", identity);
        return Ok(AirdropResult::awaiting_collection());
    }

    match ctx.state.claim_airdrop(identity, now_nanos(), ctx.claim_ttl_nanos)? {
        ClaimOutcome::AlreadyDone { tx_id } => return Ok(AirdropResult::claimed_earlier(tx_id)),
        ClaimOutcome::InFlight => return Err(QuestDropError::AirdropInFlight { identity: identity.to_string() }),
        ClaimOutcome::Acquired { .. } => {}
    }

    match issue(ctx, identity).await {
        Ok(result) => {
            ctx.state.complete_airdrop(identity, result.tx_id, now_nanos())?;
            Ok(result)
        }
        Err(err) => {
            warn!("airdrop failed identity={} kind={} err={}", identity, err.kind(), err);
            ctx.state.release_airdrop(identity, &err.to_string(), now_nanos())?;
            Err(err)
        }
    }
}

async fn issue(ctx: &PipelineContext, identity: &Identity) -> Result<AirdropResult> {
    let tx_id = match ctx.ledger.mutate(LedgerEntrypoint::IssueAirdrop, identity).await {
        Ok(tx_id) => tx_id,
        // The ledger enforces one issuance per identity; a duplicate rejection
        // is the expected outcome of a lost race, not a failure.
        Err(QuestDropError::AlreadyClaimed { .. }) => {
            info!("ledger reports already claimed identity={}", identity);
            return Ok(AirdropResult::claimed_earlier(None));
        }
        Err(err) => return Err(err),
    };

    ctx.ledger.await_sealed(&tx_id, ctx.seal_deadline).await?;
    info!("airdrop issued identity={} tx_id={}", identity, tx_id);
    Ok(AirdropResult::issued(tx_id))
}
