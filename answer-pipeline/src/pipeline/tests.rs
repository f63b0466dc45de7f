use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::types::{
        medical_document::{CorpusSource, MedicalDocument},
        system_prompts::{
            DIRECTIVE_PROMPT_INSTRUCTIONS, HIGH_CONFIDENCE_CONTEXT_HEADER,
            MEDIUM_CONFIDENCE_CONTEXT_HEADER,
        },
    },
};
use retrieval_pipeline::{ConfidenceTier, CorpusIndex, VectorizerConfig};
use tokio::sync::Mutex;

use super::{
    config::{AnswerConfig, AnswerTuning},
    generation::{orchestrate, AttemptOutcome, GenerationOutcome},
    services::{GenerationBackend, ImageInput},
    AnswerPipeline, AnswerStage,
};
use crate::utils::canned::{
    directive_disclaimer, image_analysis_failure, image_read_failure, static_response,
    tier_disclaimer, Language, EMPTY_INPUT_REPLY,
};

const LONG_ARABIC_ANSWER: &str = "ملخص الأعراض: العطش الشديد وكثرة التبول والتعب المستمر. التشخيصات المحتملة: داء السكري من النوع الثاني. الإجراءات الموصى بها: فحص سكر الدم الصائم. الاختصاصي الموصى به: طبيب الغدد الصماء.";

const LONG_ENGLISH_ANSWER: &str = "Symptoms Summary: rare genetic disorders vary widely. Possible Conditions: depends on the gene involved. Recommended Actions: genetic counselling and testing. Suggested Specialist: a clinical geneticist.";

/// Replies from a fixed script and records every prompt it receives.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    prompts: Mutex<Vec<String>>,
    images: Mutex<Vec<ImageInput>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<String, AppError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
        }
    }

    fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn next_reply(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Backend("backend unavailable".into())))
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.next_reply(prompt).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, AppError> {
        self.images.lock().await.push(image.clone());
        self.next_reply(prompt).await
    }
}

/// Never answers within any reasonable timeout.
struct StalledBackend;

#[async_trait]
impl GenerationBackend for StalledBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }

    async fn generate_with_image(
        &self,
        _prompt: &str,
        _image: &ImageInput,
    ) -> Result<String, AppError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }

    fn supports_images(&self) -> bool {
        false
    }
}

fn fallback_index() -> Arc<CorpusIndex> {
    Arc::new(
        CorpusIndex::build_fallback(&VectorizerConfig::default()).expect("fallback index builds"),
    )
}

fn arabic_index() -> Arc<CorpusIndex> {
    let documents = vec![
        MedicalDocument::new(
            "ما هي أعراض السكري؟",
            "أعراض السكري تشمل العطش الشديد، كثرة التبول خاصة ليلاً، التعب والإرهاق المستمر.",
            "Diabetes",
        ),
        MedicalDocument::new(
            "كيف يمكن علاج ارتفاع ضغط الدم؟",
            "علاج ارتفاع ضغط الدم يشمل تقليل الملح وممارسة الرياضة بانتظام.",
            "Hypertension",
        ),
        MedicalDocument::new(
            "كيف أعالج نزلة البرد؟",
            "علاج نزلة البرد يشمل الراحة التامة وشرب السوائل الدافئة.",
            "Common Cold",
        ),
    ];
    Arc::new(
        CorpusIndex::build(
            documents,
            CorpusSource::Primary {
                path: "arabic.csv".into(),
            },
            &VectorizerConfig::default(),
        )
        .expect("index builds"),
    )
}

fn pipeline_with(index: Arc<CorpusIndex>, backend: Arc<ScriptedBackend>) -> AnswerPipeline {
    AnswerPipeline::with_backend(index, backend, AnswerConfig::default())
}

#[tokio::test(start_paused = true)]
async fn orchestrate_retries_until_success() {
    let backend = ScriptedBackend::new(vec![
        Err(AppError::Backend("503".into())),
        Ok("   ".into()),
        Ok("final answer".into()),
    ]);
    let started = tokio::time::Instant::now();

    let (outcome, attempts) = orchestrate(&backend, "prompt", &AnswerTuning::default()).await;

    assert_eq!(outcome, GenerationOutcome::Generated("final answer".into()));
    assert_eq!(attempts.len(), 3);
    assert!(matches!(attempts[0].outcome, AttemptOutcome::BackendError(_)));
    assert_eq!(attempts[1].outcome, AttemptOutcome::EmptyResponse);
    assert_eq!(attempts[2].outcome, AttemptOutcome::Success("final answer".into()));
    assert_eq!(
        attempts.iter().map(|a| a.attempt_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(started.elapsed() >= Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn orchestrate_gives_up_after_max_attempts() {
    let backend = ScriptedBackend::always_failing();

    let (outcome, attempts) = orchestrate(&backend, "prompt", &AnswerTuning::default()).await;

    assert_eq!(outcome, GenerationOutcome::Failed);
    assert_eq!(attempts.len(), 3);
    assert!(attempts.iter().all(|a| a.prompt == "prompt"));
}

#[tokio::test(start_paused = true)]
async fn orchestrate_retries_every_backend_error() {
    let backend = ScriptedBackend::new(vec![
        Err(AppError::Validation("bad request".into())),
        Ok("recovered".into()),
    ]);

    let (outcome, attempts) = orchestrate(&backend, "prompt", &AnswerTuning::default()).await;

    assert_eq!(outcome, GenerationOutcome::Generated("recovered".into()));
    assert_eq!(attempts.len(), 2);
    assert!(matches!(attempts[0].outcome, AttemptOutcome::BackendError(_)));
    assert_eq!(backend.prompts().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn orchestrate_times_out_stalled_backend() {
    let tuning = AnswerTuning {
        max_attempts: 1,
        ..AnswerTuning::default()
    };

    let (outcome, attempts) = orchestrate(&StalledBackend, "prompt", &tuning).await;

    assert_eq!(outcome, GenerationOutcome::Failed);
    assert!(matches!(
        &attempts[0].outcome,
        AttemptOutcome::BackendError(message) if message.contains("timed out")
    ));
}

#[tokio::test]
async fn blank_input_is_rejected_before_the_pipeline() {
    let backend = Arc::new(ScriptedBackend::always_failing());
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let outcome = pipeline.answer_with_trace("  \n\t ").await;

    assert_eq!(outcome.text, EMPTY_INPUT_REPLY);
    assert_eq!(outcome.stage, AnswerStage::Canned);
    assert!(backend.prompts().await.is_empty());
}

#[tokio::test]
async fn greetings_and_thanks_skip_retrieval() {
    let backend = Arc::new(ScriptedBackend::always_failing());
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let greeting = pipeline.answer_with_trace("مرحبا").await;
    let thanks = pipeline.answer_with_trace("thank you!").await;

    assert_eq!(greeting.stage, AnswerStage::Canned);
    assert!(greeting.text.starts_with("مرحباً"));
    assert_eq!(thanks.stage, AnswerStage::Canned);
    assert!(thanks.text.starts_with("You're welcome"));
    assert!(backend.prompts().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn always_failing_backend_yields_static_answer() {
    let backend = Arc::new(ScriptedBackend::always_failing());
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let outcome = pipeline.answer_with_trace("عندي حمى منذ يومين").await;

    assert_eq!(outcome.stage, AnswerStage::StaticFallback);
    assert_eq!(outcome.text, static_response("عندي حمى"));
    assert!(!outcome.text.is_empty());
    // Three tiered attempts, then three directive attempts.
    assert_eq!(backend.prompts().await.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn unknown_english_query_gets_generic_static_answer() {
    let backend = Arc::new(ScriptedBackend::always_failing());
    let pipeline = pipeline_with(fallback_index(), backend);

    let text = pipeline.answer("Is it safe to donate plasma twice a week?").await;

    assert_eq!(text, static_response("something unrelated"));
}

#[tokio::test]
async fn arabic_diabetes_question_is_grounded() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(format!(
        "**{LONG_ARABIC_ANSWER}**"
    ))]));
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let outcome = pipeline.answer_with_trace("ما هي أعراض السكري؟").await;

    assert_eq!(outcome.stage, AnswerStage::Tiered);
    assert_eq!(outcome.tier, Some(ConfidenceTier::High));
    let top = outcome.matches.first().expect("diabetes match");
    assert_eq!(top.document.category, "Diabetes");
    assert!(top.similarity > 0.10);
    assert_eq!(
        outcome.text,
        format!(
            "{LONG_ARABIC_ANSWER}\n\n{}",
            tier_disclaimer(ConfidenceTier::High, Language::Arabic)
        )
    );

    let prompts = backend.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(HIGH_CONFIDENCE_CONTEXT_HEADER));
    assert!(prompts[0].contains("[Diabetes]"));
}

#[tokio::test]
async fn rare_english_question_falls_to_low_tier() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(LONG_ENGLISH_ANSWER.into())]));
    let pipeline = pipeline_with(arabic_index(), Arc::clone(&backend));

    let outcome = pipeline
        .answer_with_trace("What is the treatment for a very rare genetic disorder?")
        .await;

    assert_eq!(outcome.tier, Some(ConfidenceTier::Low));
    assert!(outcome.matches.iter().all(|m| m.similarity < 0.05));
    assert_eq!(outcome.stage, AnswerStage::Tiered);
    assert!(outcome
        .text
        .ends_with(tier_disclaimer(ConfidenceTier::Low, Language::English)));

    let prompts = backend.prompts().await;
    assert!(!prompts[0].contains(HIGH_CONFIDENCE_CONTEXT_HEADER));
    assert!(!prompts[0].contains(MEDIUM_CONFIDENCE_CONTEXT_HEADER));
    assert!(!prompts[0].contains("[Diabetes]"));
}

#[tokio::test]
async fn short_tiered_reply_escalates_to_directive() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok("ok".into()),
        Ok(LONG_ENGLISH_ANSWER.into()),
    ]));
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let outcome = pipeline.answer_with_trace("What causes back pain?").await;

    assert_eq!(outcome.stage, AnswerStage::Directive);
    assert_eq!(
        outcome.text,
        format!(
            "{LONG_ENGLISH_ANSWER}\n\n{}",
            directive_disclaimer(Language::English)
        )
    );
    let prompts = backend.prompts().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(DIRECTIVE_PROMPT_INSTRUCTIONS));
}

#[tokio::test]
async fn short_refusal_escalates_to_directive() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok("لا يمكنني تشخيص حالتك.".into()),
        Ok(LONG_ARABIC_ANSWER.into()),
    ]));
    let pipeline = pipeline_with(fallback_index(), backend);

    let outcome = pipeline.answer_with_trace("ما هي أعراض السكري؟").await;

    assert_eq!(outcome.stage, AnswerStage::Directive);
    assert!(outcome.text.ends_with(directive_disclaimer(Language::Arabic)));
}

#[tokio::test(start_paused = true)]
async fn directive_failure_marker_falls_back_to_static() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(String::new()),
        Ok(String::new()),
        Ok(String::new()),
        Ok("غير قادر على توليد استجابة بعد عدة محاولات.".into()),
    ]));
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let outcome = pipeline.answer_with_trace("عندي صداع شديد").await;

    assert_eq!(outcome.stage, AnswerStage::StaticFallback);
    assert_eq!(outcome.text, static_response("صداع"));
    assert_eq!(backend.prompts().await.len(), 4);
}

#[tokio::test]
async fn health_reports_index_and_backend() {
    let pipeline = AnswerPipeline::with_backend(
        fallback_index(),
        Arc::new(StalledBackend),
        AnswerConfig::default(),
    );

    let health = pipeline.health();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.documents_loaded, 8);
    assert!(health.vocabulary_size > 0);
    assert_eq!(health.corpus_source, "fallback");
    assert!(!health.image_analysis_enabled);
    assert!(health.allowed_extensions.contains(&"webp"));
}

#[tokio::test]
async fn debug_retrieve_respects_k() {
    let pipeline = pipeline_with(fallback_index(), Arc::new(ScriptedBackend::always_failing()));

    let matches = pipeline.debug_retrieve("ما هي أعراض الصداع النصفي؟", Some(2));
    assert!(matches.len() <= 2);
    assert_eq!(
        matches.first().map(|m| m.document.category.as_str()),
        Some("Migraine")
    );

    let diagnostics = pipeline.diagnose("zzzz", None);
    assert!(diagnostics.candidates.is_empty());
}

#[tokio::test]
async fn image_analysis_cleans_backend_reply() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(
        "**X-ray** looks *normal*".into()
    )]));
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let reply = pipeline
        .analyze_image_base64("data:image/jpeg;base64,/9j/4A==", Some("Is this normal?"))
        .await;

    assert_eq!(reply, "X-ray looks normal");
    let images = backend.images.lock().await.clone();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].mime_type, "image/jpeg");
    assert!(backend.prompts().await[0].contains("Is this normal?"));
}

#[tokio::test]
async fn image_failures_return_apology_text() {
    let backend = Arc::new(ScriptedBackend::always_failing());
    let pipeline = pipeline_with(fallback_index(), Arc::clone(&backend));

    let unreadable = pipeline.analyze_image_base64("%%%", None).await;
    assert_eq!(unreadable, image_read_failure(Language::Arabic));
    assert!(backend.prompts().await.is_empty());

    let not_an_image = pipeline.analyze_image_base64("aGVsbG8=", None).await;
    assert_eq!(not_an_image, image_read_failure(Language::Arabic));
    assert!(backend.prompts().await.is_empty());

    let failed = pipeline
        .analyze_image_base64("iVBORw0KGgo=", Some("what is this pill?"))
        .await;
    assert_eq!(failed, image_analysis_failure(Language::English));

    let missing = pipeline
        .analyze_image_file(std::path::Path::new("/nonexistent/scan.png"), None)
        .await;
    assert_eq!(missing, image_read_failure(Language::Arabic));
}
