use tokio::time::{sleep, timeout};
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use super::{config::AnswerTuning, services::GenerationBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(String),
    EmptyResponse,
    BackendError(String),
}

/// Record of one call to the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    pub prompt: String,
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    Failed,
}

impl GenerationOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated(text) => Some(text),
            Self::Failed => None,
        }
    }
}

/// Calls the backend until it returns non-blank text or attempts run out.
///
/// Every call runs under `request_timeout`; failed attempts wait a fixed
/// `backoff` before the next one.
pub async fn orchestrate(
    backend: &dyn GenerationBackend,
    prompt: &str,
    tuning: &AnswerTuning,
) -> (GenerationOutcome, Vec<GenerationAttempt>) {
    let max_attempts = tuning.max_attempts.max(1);
    let mut delays =
        FixedInterval::new(tuning.backoff).take(max_attempts.saturating_sub(1) as usize);
    let mut attempts = Vec::with_capacity(max_attempts as usize);
    let mut attempt_number: u32 = 1;

    loop {
        let result = timeout(tuning.request_timeout, backend.generate(prompt)).await;
        let outcome = match result {
            Ok(Ok(text)) if !text.trim().is_empty() => AttemptOutcome::Success(text),
            Ok(Ok(_)) => {
                warn!(
                    attempt = attempt_number,
                    "Generation backend returned an empty response"
                );
                AttemptOutcome::EmptyResponse
            }
            Ok(Err(err)) => {
                warn!(
                    attempt = attempt_number,
                    error = %err,
                    "Generation backend call failed"
                );
                AttemptOutcome::BackendError(err.to_string())
            }
            Err(_) => {
                warn!(
                    attempt = attempt_number,
                    timeout_secs = tuning.request_timeout.as_secs(),
                    "Generation backend call timed out"
                );
                AttemptOutcome::BackendError(format!(
                    "request timed out after {}s",
                    tuning.request_timeout.as_secs()
                ))
            }
        };

        let generated = match &outcome {
            AttemptOutcome::Success(text) => Some(text.clone()),
            AttemptOutcome::EmptyResponse | AttemptOutcome::BackendError(_) => None,
        };
        attempts.push(GenerationAttempt {
            prompt: prompt.to_string(),
            attempt_number,
            outcome,
        });

        if let Some(text) = generated {
            debug!(
                attempt = attempt_number,
                chars = text.chars().count(),
                "Generation succeeded"
            );
            return (GenerationOutcome::Generated(text), attempts);
        }
        match delays.next() {
            Some(delay) => {
                sleep(delay).await;
                attempt_number = attempt_number.saturating_add(1);
            }
            None => break,
        }
    }

    warn!(attempts = attempts.len(), "Generation failed after all attempts");
    (GenerationOutcome::Failed, attempts)
}
