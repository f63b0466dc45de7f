mod config;

pub use config::{RetrievalConfig, RetrievalTuning, TierThresholds, VectorizerConfig};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    index::CorpusIndex,
    scoring::{adaptive_threshold, cosine_similarity, sort_by_similarity_desc, Candidate},
    RetrievedDocument,
};

/// Matches plus the numbers that decided which of them survived.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalDiagnostics {
    pub max_similarity: f32,
    pub effective_threshold: f32,
    pub candidates: Vec<RetrievedDocument>,
}

/// Ranked matches for the query, at most `k`, in non-increasing similarity.
pub fn retrieve(
    index: &CorpusIndex,
    query: &str,
    k: usize,
    tuning: &RetrievalTuning,
) -> Vec<RetrievedDocument> {
    retrieve_with_diagnostics(index, query, k, tuning).candidates
}

#[instrument(skip_all, fields(k = k, documents = index.len()))]
pub fn retrieve_with_diagnostics(
    index: &CorpusIndex,
    query: &str,
    k: usize,
    tuning: &RetrievalTuning,
) -> RetrievalDiagnostics {
    let query_chars = query.chars().count();
    let preview: String = query.chars().take(120).collect::<String>().replace('\n', " ");
    info!(
        query_chars,
        preview_truncated = query_chars > preview.chars().count(),
        preview = %preview,
        "Starting retrieval"
    );

    if k == 0 || index.is_empty() {
        return RetrievalDiagnostics::default();
    }

    let query_vector = index.query_vector(query);
    if query_vector.is_empty() {
        debug!("Query has no terms in the index vocabulary");
        return RetrievalDiagnostics {
            effective_threshold: adaptive_threshold(0.0, tuning),
            ..RetrievalDiagnostics::default()
        };
    }

    let mut candidates: Vec<Candidate> = index
        .document_vectors()
        .iter()
        .enumerate()
        .map(|(row, vector)| Candidate {
            row,
            similarity: cosine_similarity(&query_vector, vector),
        })
        .collect();
    sort_by_similarity_desc(&mut candidates);
    candidates.truncate(k);

    let max_similarity = candidates.first().map_or(0.0, |c| c.similarity);
    let effective_threshold = adaptive_threshold(max_similarity, tuning);

    let mut kept: Vec<Candidate> = candidates
        .iter()
        .copied()
        .filter(|c| c.similarity >= effective_threshold)
        .collect();

    if kept.is_empty() {
        if let Some(best) = candidates.first().filter(|c| c.similarity > tuning.noise_floor) {
            debug!(
                similarity = best.similarity,
                "No candidate cleared the threshold; keeping the single best"
            );
            kept.push(*best);
        }
    }

    debug!(
        max_similarity,
        effective_threshold,
        kept = kept.len(),
        "Scored query against corpus"
    );

    let candidates = kept
        .into_iter()
        .enumerate()
        .filter_map(|(position, candidate)| {
            index.document(candidate.row).map(|document| RetrievedDocument {
                document: document.clone(),
                similarity: candidate.similarity,
                rank: position + 1,
            })
        })
        .collect();

    RetrievalDiagnostics {
        max_similarity,
        effective_threshold,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::medical_document::{CorpusSource, MedicalDocument};

    fn fallback_index() -> CorpusIndex {
        CorpusIndex::build_fallback(&VectorizerConfig::default()).expect("fallback index builds")
    }

    fn weak_match_index() -> CorpusIndex {
        // All terms of the first document are unique, so they share one idf and
        // "fever" carries weight 1/sqrt(627) after normalization.
        let filler = (0..209)
            .map(|i| format!("term{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let documents = vec![
            MedicalDocument::new("fever", filler, "Fever"),
            MedicalDocument::new("cough", "rash", "Skin"),
            MedicalDocument::new("back", "pain", "Back"),
            MedicalDocument::new("sore", "throat", "Throat"),
        ];
        CorpusIndex::build(
            documents,
            CorpusSource::Primary {
                path: "weak.csv".into(),
            },
            &VectorizerConfig::default(),
        )
        .expect("index builds")
    }

    #[test]
    fn arabic_diabetes_query_hits_diabetes_document() {
        let index = fallback_index();
        let matches = retrieve(&index, "ما هي أعراض السكري؟", 3, &RetrievalTuning::default());

        let top = matches.first().expect("at least one match");
        assert_eq!(top.document.category, "Diabetes");
        assert_eq!(top.rank, 1);
        assert!(top.similarity > 0.10, "similarity {}", top.similarity);
    }

    #[test]
    fn results_are_sorted_and_bounded_by_k() {
        let index = fallback_index();
        let tuning = RetrievalTuning::default();
        let queries = [
            "What are the symptoms of flu?",
            "ما هي أعراض الصداع النصفي؟",
            "back pain after lifting",
            "كيف أعالج نزلة البرد؟",
            "medical health symptoms treatment",
        ];

        for query in queries {
            for k in 1..=5 {
                let matches = retrieve(&index, query, k, &tuning);
                assert!(matches.len() <= k, "{query:?} returned too many");
                for pair in matches.windows(2) {
                    assert!(pair[0].similarity >= pair[1].similarity);
                    assert_eq!(pair[0].rank + 1, pair[1].rank);
                }
                for m in &matches {
                    assert!((0.0..=1.0).contains(&m.similarity));
                }
            }
        }
    }

    #[test]
    fn weak_match_is_kept_by_adaptive_threshold() {
        let index = weak_match_index();
        let diagnostics = retrieve_with_diagnostics(&index, "fever", 3, &RetrievalTuning::default());

        assert_eq!(diagnostics.candidates.len(), 1);
        let hit = &diagnostics.candidates[0];
        assert_eq!(hit.document.category, "Fever");
        assert!(hit.similarity > 0.03 && hit.similarity < 0.10, "similarity {}", hit.similarity);
        assert!((diagnostics.effective_threshold - 0.02).abs() < 1e-3);
        assert!(hit.similarity < RetrievalTuning::default().base_threshold);
    }

    #[test]
    fn single_best_survives_when_threshold_rejects_everything() {
        let index = weak_match_index();
        let strict = RetrievalTuning {
            base_threshold: 0.9,
            adaptive_floor: 0.5,
            ..RetrievalTuning::default()
        };
        let matches = retrieve(&index, "fever", 3, &strict);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].document.category, "Fever");

        let noisy = RetrievalTuning {
            noise_floor: 0.05,
            ..strict
        };
        assert!(retrieve(&index, "fever", 3, &noisy).is_empty());
    }

    #[test]
    fn shared_question_words_lift_english_queries_to_medium() {
        // Only "what" is shared with the flu question, which is enough for MEDIUM.
        let index = fallback_index();
        let matches = retrieve(
            &index,
            "What is the treatment for a very rare genetic disorder?",
            3,
            &RetrievalTuning::default(),
        );

        let top = matches.first().expect("flu question matches");
        assert_eq!(top.document.category, "Influenza");
        assert!(top.similarity >= 0.05 && top.similarity < 0.10);
        assert_eq!(
            crate::tier::ConfidenceTier::select(&matches, &TierThresholds::default()),
            crate::tier::ConfidenceTier::Medium
        );
    }

    #[test]
    fn unrelated_or_empty_queries_return_nothing() {
        let index = fallback_index();
        let tuning = RetrievalTuning::default();
        assert!(retrieve(&index, "zzzz qqqq", 3, &tuning).is_empty());
        assert!(retrieve(&index, "", 3, &tuning).is_empty());
        assert!(retrieve(&index, "diabetes", 0, &tuning).is_empty());
    }
}
