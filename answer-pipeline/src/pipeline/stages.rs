use common::error::AppError;
use retrieval_pipeline::{
    answer_retrieval::{compose, compose_directive},
    retrieve, ConfidenceTier,
};
use state_machines::core::GuardError;
use tracing::{debug, info, instrument};

use super::{
    context::AnswerContext,
    generation::{orchestrate, GenerationOutcome},
    state::{Answered, AnswerMachine, Escalated, Prompted, Ready, Retrieved},
    AnswerStage,
};
use crate::utils::{
    canned::{directive_disclaimer, static_response, tier_disclaimer, with_disclaimer},
    cleaner::{clean, contains_failure_marker},
};

/// Result of the tiered generation stage.
pub enum GroundedOutcome {
    Answered(AnswerMachine<(), Answered>),
    Escalated(AnswerMachine<(), Escalated>),
}

#[instrument(level = "trace", skip_all)]
pub fn retrieve_matches(
    machine: AnswerMachine<(), Ready>,
    ctx: &mut AnswerContext<'_>,
) -> Result<AnswerMachine<(), Retrieved>, AppError> {
    let retrieval = &ctx.config.retrieval;
    let matches = retrieve(ctx.index, ctx.query, retrieval.tuning.take, &retrieval.tuning);
    let tier = ConfidenceTier::select(&matches, &retrieval.tiers);

    debug!(
        matches = matches.len(),
        top_similarity = matches.first().map_or(0.0, |m| m.similarity),
        %tier,
        "answer pipeline retrieved context"
    );

    ctx.matches = matches;
    ctx.tier = Some(tier);

    machine
        .retrieve()
        .map_err(|(_, guard)| map_guard_error("retrieve", guard))
}

#[instrument(level = "trace", skip_all)]
pub fn compose_prompt(
    machine: AnswerMachine<(), Retrieved>,
    ctx: &mut AnswerContext<'_>,
) -> Result<AnswerMachine<(), Prompted>, AppError> {
    let tier = ctx.tier()?;
    ctx.prompt = Some(compose(tier, ctx.query, &ctx.matches));

    machine
        .compose()
        .map_err(|(_, guard)| map_guard_error("compose", guard))
}

/// Generates from the tiered prompt; short, refused or failed replies escalate.
#[instrument(level = "trace", skip_all)]
pub async fn generate_tiered(
    machine: AnswerMachine<(), Prompted>,
    ctx: &mut AnswerContext<'_>,
) -> Result<GroundedOutcome, AppError> {
    let tier = ctx.tier()?;
    let (outcome, attempts) =
        orchestrate(ctx.backend, ctx.prompt()?, &ctx.config.tuning).await;
    ctx.attempts.extend(attempts);

    let cleaned = outcome.text().map(clean).unwrap_or_default();
    let cleaned_chars = cleaned.chars().count();

    if cleaned_chars >= ctx.config.tuning.min_answer_chars {
        let text = with_disclaimer(&cleaned, tier_disclaimer(tier, ctx.language));
        ctx.answer = Some((text, AnswerStage::Tiered));
        return machine
            .settle()
            .map(GroundedOutcome::Answered)
            .map_err(|(_, guard)| map_guard_error("settle", guard));
    }

    info!(
        %tier,
        generated = matches!(outcome, GenerationOutcome::Generated(_)),
        cleaned_chars,
        "tiered answer unusable; escalating to directive prompt"
    );

    machine
        .escalate()
        .map(GroundedOutcome::Escalated)
        .map_err(|(_, guard)| map_guard_error("escalate", guard))
}

/// Last generation attempt with a directive prompt, then the static answer.
#[instrument(level = "trace", skip_all)]
pub async fn generate_directive(
    machine: AnswerMachine<(), Escalated>,
    ctx: &mut AnswerContext<'_>,
) -> Result<AnswerMachine<(), Answered>, AppError> {
    let prompt = compose_directive(ctx.query);
    let (outcome, attempts) = orchestrate(ctx.backend, &prompt, &ctx.config.tuning).await;
    ctx.attempts.extend(attempts);

    let usable = outcome
        .text()
        .filter(|text| !contains_failure_marker(text))
        .map(clean)
        .filter(|cleaned| !cleaned.is_empty());

    ctx.answer = Some(match usable {
        Some(cleaned) => (
            with_disclaimer(&cleaned, directive_disclaimer(ctx.language)),
            AnswerStage::Directive,
        ),
        None => {
            info!("directive answer unusable; returning static response");
            (
                static_response(ctx.query).to_string(),
                AnswerStage::StaticFallback,
            )
        }
    });

    machine
        .settle()
        .map_err(|(_, guard)| map_guard_error("settle", guard))
}

fn map_guard_error(stage: &'static str, err: GuardError) -> AppError {
    AppError::InternalError(format!(
        "answer transition '{stage}' rejected: guard={}, event={}, kind={:?}",
        err.guard, err.event, err.kind
    ))
}
