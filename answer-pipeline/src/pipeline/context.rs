use common::error::AppError;
use retrieval_pipeline::{ConfidenceTier, CorpusIndex, RetrievedDocument};
use tracing::error;

use super::{
    config::AnswerConfig, generation::GenerationAttempt, services::GenerationBackend,
    AnswerOutcome, AnswerStage,
};
use crate::utils::canned::Language;

pub struct AnswerContext<'a> {
    pub query: &'a str,
    pub language: Language,
    pub config: &'a AnswerConfig,
    pub index: &'a CorpusIndex,
    pub backend: &'a dyn GenerationBackend,
    pub matches: Vec<RetrievedDocument>,
    pub tier: Option<ConfidenceTier>,
    pub prompt: Option<String>,
    pub attempts: Vec<GenerationAttempt>,
    pub answer: Option<(String, AnswerStage)>,
}

impl<'a> AnswerContext<'a> {
    pub fn new(
        query: &'a str,
        config: &'a AnswerConfig,
        index: &'a CorpusIndex,
        backend: &'a dyn GenerationBackend,
    ) -> Self {
        Self {
            query,
            language: Language::detect(query),
            config,
            index,
            backend,
            matches: Vec::new(),
            tier: None,
            prompt: None,
            attempts: Vec::new(),
            answer: None,
        }
    }

    pub fn tier(&self) -> Result<ConfidenceTier, AppError> {
        self.tier
            .ok_or_else(|| AppError::InternalError("confidence tier expected to be selected".into()))
    }

    pub fn prompt(&self) -> Result<&str, AppError> {
        self.prompt
            .as_deref()
            .ok_or_else(|| AppError::InternalError("tiered prompt expected to be composed".into()))
    }

    pub fn into_outcome(self) -> Result<AnswerOutcome, AppError> {
        let (text, stage) = self.answer.ok_or_else(|| {
            AppError::InternalError("answer expected to be settled before completion".into())
        })?;
        Ok(AnswerOutcome {
            text,
            stage,
            tier: self.tier,
            matches: self.matches,
        })
    }

    pub fn abort(&self, err: AppError) -> AppError {
        error!(
            query_chars = self.query.chars().count(),
            tier = ?self.tier,
            attempts = self.attempts.len(),
            error = %err,
            "answer pipeline aborted"
        );
        err
    }
}
