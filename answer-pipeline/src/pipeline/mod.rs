mod config;
mod context;
mod generation;
mod services;
mod stages;
mod state;

pub use config::{AnswerConfig, AnswerTuning};
pub use generation::{orchestrate, AttemptOutcome, GenerationAttempt, GenerationOutcome};
pub use services::{GenerationBackend, ImageInput, OpenAiBackend};

use std::{path::Path, sync::Arc, time::Instant};

use common::{error::AppError, utils::config::AppConfig};
use retrieval_pipeline::{
    answer_retrieval::compose_image_prompt, retrieve_with_diagnostics, ConfidenceTier,
    CorpusIndex, RetrievalDiagnostics, RetrievedDocument,
};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use self::{
    context::AnswerContext,
    stages::{
        compose_prompt, generate_directive, generate_tiered, retrieve_matches, GroundedOutcome,
    },
    state::ready,
};
use crate::utils::{
    canned::{
        image_analysis_failure, image_read_failure, precheck, static_response, Language,
        EMPTY_INPUT_REPLY,
    },
    cleaner::clean,
    image_parsing::{decode_image_base64, load_image_file, ALLOWED_EXTENSIONS},
};

/// Which step of the escalation chain produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStage {
    Canned,
    Tiered,
    Directive,
    StaticFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub text: String,
    pub stage: AnswerStage,
    pub tier: Option<ConfidenceTier>,
    pub matches: Vec<RetrievedDocument>,
}

impl AnswerOutcome {
    fn canned(text: impl Into<String>, stage: AnswerStage) -> Self {
        Self {
            text: text.into(),
            stage,
            tier: None,
            matches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub documents_loaded: usize,
    pub vocabulary_size: usize,
    pub corpus_source: String,
    pub image_analysis_enabled: bool,
    pub allowed_extensions: Vec<&'static str>,
}

pub struct AnswerPipeline {
    index: Arc<CorpusIndex>,
    backend: Arc<dyn GenerationBackend>,
    config: AnswerConfig,
}

impl AnswerPipeline {
    /// Pipeline backed by the OpenAI-compatible endpoint from configuration.
    pub fn new(index: Arc<CorpusIndex>, app_config: &AppConfig) -> Self {
        Self::with_backend(
            index,
            Arc::new(OpenAiBackend::from_config(app_config)),
            AnswerConfig::from_app_config(app_config),
        )
    }

    pub fn with_backend(
        index: Arc<CorpusIndex>,
        backend: Arc<dyn GenerationBackend>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            index,
            backend,
            config,
        }
    }

    /// Answers a user message. Always returns non-empty text.
    pub async fn answer(&self, query: &str) -> String {
        self.answer_with_trace(query).await.text
    }

    #[instrument(skip_all, fields(query_chars = query.chars().count()))]
    pub async fn answer_with_trace(&self, query: &str) -> AnswerOutcome {
        let query = query.trim();
        if query.is_empty() {
            return AnswerOutcome::canned(EMPTY_INPUT_REPLY, AnswerStage::Canned);
        }

        if let Some((rule, reply)) = precheck(query) {
            info!(rule, "answered from canned table");
            return AnswerOutcome::canned(reply, AnswerStage::Canned);
        }

        match self.drive_pipeline(query).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "answer pipeline failed; returning static response");
                AnswerOutcome::canned(static_response(query), AnswerStage::StaticFallback)
            }
        }
    }

    async fn drive_pipeline(&self, query: &str) -> Result<AnswerOutcome, AppError> {
        let started = Instant::now();
        let mut ctx = AnswerContext::new(
            query,
            &self.config,
            self.index.as_ref(),
            self.backend.as_ref(),
        );

        let machine = ready();
        let machine = retrieve_matches(machine, &mut ctx).map_err(|err| ctx.abort(err))?;
        let machine = compose_prompt(machine, &mut ctx).map_err(|err| ctx.abort(err))?;
        let _machine = match generate_tiered(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?
        {
            GroundedOutcome::Answered(machine) => machine,
            GroundedOutcome::Escalated(machine) => generate_directive(machine, &mut ctx)
                .await
                .map_err(|err| ctx.abort(err))?,
        };

        let outcome = ctx.into_outcome()?;
        info!(
            stage = ?outcome.stage,
            tier = ?outcome.tier,
            matches = outcome.matches.len(),
            total_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "answer pipeline finished"
        );
        Ok(outcome)
    }

    /// Retrieval only, for inspecting what a query matches.
    pub fn debug_retrieve(&self, query: &str, k: Option<usize>) -> Vec<RetrievedDocument> {
        self.diagnose(query, k).candidates
    }

    pub fn diagnose(&self, query: &str, k: Option<usize>) -> RetrievalDiagnostics {
        let k = k.unwrap_or(self.config.tuning.debug_k);
        retrieve_with_diagnostics(&self.index, query, k, &self.config.retrieval.tuning)
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            documents_loaded: self.index.len(),
            vocabulary_size: self.index.vocabulary_len(),
            corpus_source: self.index.source().to_string(),
            image_analysis_enabled: self.backend.supports_images(),
            allowed_extensions: ALLOWED_EXTENSIONS.to_vec(),
        }
    }

    /// Describes an image given as base64 (optionally a data URL).
    pub async fn analyze_image_base64(&self, data: &str, prompt: Option<&str>) -> String {
        let language = prompt.map_or(Language::Arabic, Language::detect);
        match decode_image_base64(data) {
            Ok(image) => self.analyze_image(&image, prompt, language).await,
            Err(err) => {
                warn!(error = %err, "could not decode image payload");
                image_read_failure(language).to_string()
            }
        }
    }

    pub async fn analyze_image_file(&self, path: &Path, prompt: Option<&str>) -> String {
        let language = prompt.map_or(Language::Arabic, Language::detect);
        match load_image_file(path).await {
            Ok(image) => self.analyze_image(&image, prompt, language).await,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not load image file");
                image_read_failure(language).to_string()
            }
        }
    }

    #[instrument(skip_all, fields(mime = %image.mime_type))]
    async fn analyze_image(
        &self,
        image: &ImageInput,
        prompt: Option<&str>,
        language: Language,
    ) -> String {
        if !self.backend.supports_images() {
            warn!("image analysis requested but the backend is not configured for it");
            return image_analysis_failure(language).to_string();
        }

        let instructions = compose_image_prompt(prompt);
        let request = self.backend.generate_with_image(&instructions, image);
        let cleaned = match timeout(self.config.tuning.request_timeout, request).await {
            Ok(Ok(text)) => clean(&text),
            Ok(Err(err)) => {
                warn!(error = %err, "image analysis failed");
                String::new()
            }
            Err(_) => {
                warn!("image analysis timed out");
                String::new()
            }
        };

        if cleaned.is_empty() {
            image_analysis_failure(language).to_string()
        } else {
            cleaned
        }
    }
}

#[cfg(test)]
mod tests;
