#![allow(clippy::missing_docs_in_private_items)]

pub mod pipeline;
pub mod utils;

pub use pipeline::{
    AnswerConfig, AnswerOutcome, AnswerPipeline, AnswerStage, AnswerTuning, GenerationBackend,
    HealthReport, ImageInput, OpenAiBackend,
};
