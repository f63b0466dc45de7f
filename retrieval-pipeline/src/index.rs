use common::{
    error::AppError,
    storage::{
        corpus::{fallback_documents, FALLBACK_KEYWORDS},
        types::medical_document::{CorpusSource, MedicalDocument},
    },
};
use tracing::{info, warn};

use crate::{
    normalize::normalize, pipeline::VectorizerConfig, scoring::SparseVector,
    vectorizer::TfidfVectorizer,
};

/// A corpus document together with the text that was indexed for it.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub normalized_text: String,
    pub source: MedicalDocument,
}

/// Immutable similarity index over the loaded corpus.
///
/// `document_vectors[i]` is always the projection of `documents[i].normalized_text`.
#[derive(Debug)]
pub struct CorpusIndex {
    documents: Vec<ProcessedDocument>,
    vectorizer: TfidfVectorizer,
    document_vectors: Vec<SparseVector>,
    source: CorpusSource,
}

impl CorpusIndex {
    pub fn build(
        documents: Vec<MedicalDocument>,
        source: CorpusSource,
        config: &VectorizerConfig,
    ) -> Result<Self, AppError> {
        if documents.is_empty() {
            return Err(AppError::IndexBuild(
                "cannot build an index from an empty document set".into(),
            ));
        }

        let append_keywords = source == CorpusSource::Fallback;
        let documents: Vec<ProcessedDocument> = documents
            .into_iter()
            .map(|document| ProcessedDocument {
                normalized_text: indexed_text_for(&document, append_keywords),
                source: document,
            })
            .collect();

        let texts: Vec<&str> = documents
            .iter()
            .map(|d| d.normalized_text.as_str())
            .collect();
        let vectorizer = TfidfVectorizer::fit(&texts, config);
        if vectorizer.vocabulary_len() == 0 {
            warn!(
                documents = documents.len(),
                "Index vocabulary is empty; every query will score zero"
            );
        }

        let document_vectors = texts.iter().map(|text| vectorizer.transform(text)).collect();

        info!(
            documents = documents.len(),
            vocabulary = vectorizer.vocabulary_len(),
            source = %source,
            "Built corpus index"
        );

        Ok(Self {
            documents,
            vectorizer,
            document_vectors,
            source,
        })
    }

    /// Index over the built-in documents.
    pub fn build_fallback(config: &VectorizerConfig) -> Result<Self, AppError> {
        Self::build(fallback_documents(), CorpusSource::Fallback, config)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, row: usize) -> Option<&MedicalDocument> {
        self.documents.get(row).map(|d| &d.source)
    }

    pub fn document_vector(&self, row: usize) -> Option<&SparseVector> {
        self.document_vectors.get(row)
    }

    pub fn document_vectors(&self) -> &[SparseVector] {
        &self.document_vectors
    }

    pub fn indexed_text(&self, row: usize) -> Option<&str> {
        self.documents.get(row).map(|d| d.normalized_text.as_str())
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    pub const fn source(&self) -> &CorpusSource {
        &self.source
    }

    /// Projects already normalized text into the index's vector space.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.vectorizer.transform(text)
    }

    /// Normalizes a raw query and projects it.
    pub fn query_vector(&self, query: &str) -> SparseVector {
        self.transform(&normalize(query))
    }
}

fn indexed_text_for(document: &MedicalDocument, append_keywords: bool) -> String {
    let mut text = format!(
        "{} {}",
        normalize(&document.question),
        normalize(&document.answer)
    );
    if append_keywords {
        text.push(' ');
        text.push_str(FALLBACK_KEYWORDS);
    }
    text.trim().to_string()
}
