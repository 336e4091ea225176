use super::{check_completion, evaluate_and_airdrop, sync_objective, PipelineContext};
use crate::domain::{HandlerResult, ObjectiveCode};
use crate::foundation::{Identity, Result};
use log::{debug, info};

/// Real-time entry point for one completion event.
///
/// Validation happens before any collaborator call: an unrecognized code is a
/// structured no-op (the event source legitimately emits unrelated codes) and
/// a malformed identity is rejected with zero side effects. For a recognized
/// event: sync the triggering objective, evaluate off-chain completion, and
/// only when fully complete run the airdrop decision.
pub async fn handle_objective_event(ctx: &PipelineContext, raw_identity: &str, raw_code: &str) -> Result<HandlerResult> {
    let Some(objective) = ObjectiveCode::from_wire(raw_code) else {
        debug!("ignoring unrecognized objective code={}", raw_code);
        return Ok(HandlerResult::Unrecognized { code: raw_code.to_string() });
    };
    let identity = Identity::parse(raw_identity)?;

    info!("webhook event identity={} objective={}", identity, objective);
    let sync = sync_objective(ctx, &identity, objective).await?;
    let completion = check_completion(ctx, &identity).await?;
    let airdrop = if completion.fully_complete() {
        Some(evaluate_and_airdrop(ctx, &identity).await?)
    } else {
        None
    };

    Ok(HandlerResult::Processed { objective, sync, completion, airdrop })
}
