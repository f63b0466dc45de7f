pub mod answer_retrieval;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod tier;
pub mod vectorizer;

use common::storage::types::medical_document::MedicalDocument;
use serde::Serialize;

pub use index::CorpusIndex;
pub use pipeline::{
    retrieve, retrieve_with_diagnostics, RetrievalConfig, RetrievalDiagnostics, RetrievalTuning,
    TierThresholds, VectorizerConfig,
};
pub use tier::ConfidenceTier;

// A corpus document scored against one query. Rank starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub document: MedicalDocument,
    pub similarity: f32,
    pub rank: usize,
}
