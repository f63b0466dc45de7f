use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::{pipeline::VectorizerConfig, scoring::SparseVector};

static TOKEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b\w\w+\b").ok());

#[derive(Debug, Default, Clone, Copy)]
struct TermStats {
    total: usize,
    df: usize,
}

/// TF-IDF model over word n-grams. Fitted once, frozen afterwards.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and idf weights from the given texts.
    pub fn fit<S: AsRef<str>>(texts: &[S], config: &VectorizerConfig) -> Self {
        let n_docs = texts.len();
        let mut stats: BTreeMap<String, TermStats> = BTreeMap::new();

        for text in texts {
            for (term, count) in term_counts(analyze(text.as_ref(), config)) {
                let entry = stats.entry(term).or_default();
                entry.total += count;
                entry.df += 1;
            }
        }

        let max_doc_count = f64::from(config.max_df) * n_docs as f64;
        let min_doc_count = config.min_df.max(1);
        let within_min = |s: &TermStats| s.df >= min_doc_count;

        let mut kept: Vec<(&String, &TermStats)> = stats
            .iter()
            .filter(|(_, s)| within_min(s) && (s.df as f64) <= max_doc_count)
            .collect();

        if kept.is_empty() && !stats.is_empty() {
            warn!(
                documents = n_docs,
                terms = stats.len(),
                max_df = config.max_df,
                "Document frequency pruning removed every term; keeping unpruned vocabulary"
            );
            kept = stats.iter().filter(|(_, s)| within_min(s)).collect();
        }

        if kept.len() > config.max_features {
            // Stable sort keeps alphabetical order among equal counts.
            kept.sort_by(|a, b| b.1.total.cmp(&a.1.total));
            kept.truncate(config.max_features);
            kept.sort_by(|a, b| a.0.cmp(b.0));
        }

        let smoothed_n = (n_docs + 1) as f64;
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, s)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.clone(), index);
            idf.push(((smoothed_n / (s.df + 1) as f64).ln() + 1.0) as f32);
        }

        debug!(
            documents = n_docs,
            vocabulary = vocabulary.len(),
            "Fitted tf-idf vocabulary"
        );

        Self {
            config: config.clone(),
            vocabulary,
            idf,
        }
    }

    /// Projects text into the fitted space. Terms outside the vocabulary are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let entries = term_counts(analyze(text, &self.config))
            .into_iter()
            .filter_map(|(term, count)| {
                let index = *self.vocabulary.get(&term)?;
                let idf = *self.idf.get(index)?;
                Some((index, self.term_frequency(count) * idf))
            })
            .collect();

        SparseVector::from_entries(entries).l2_normalized()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    fn term_frequency(&self, count: usize) -> f32 {
        let tf = count as f32;
        if self.config.sublinear_tf {
            1.0 + tf.ln()
        } else {
            tf
        }
    }
}

/// Lowercases, tokenizes and expands the text into word n-grams.
pub fn analyze(text: &str, config: &VectorizerConfig) -> Vec<String> {
    let lowered = text.to_lowercase();
    let Some(token_re) = TOKEN.as_ref() else {
        return Vec::new();
    };
    let tokens: Vec<&str> = token_re.find_iter(&lowered).map(|m| m.as_str()).collect();

    let min_n = config.ngram_min.max(1);
    let max_n = config.ngram_max.max(min_n);
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        terms.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    terms
}

fn term_counts(terms: Vec<String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}
