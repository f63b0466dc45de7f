use serde::{Deserialize, Serialize};
use std::fmt;

/// One question/answer pair from the medical corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalDocument {
    pub question: String,
    pub answer: String,
    pub category: String,
}

impl MedicalDocument {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for MedicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.question)
    }
}

/// Raw corpus record as read from the CSV source. Fields stay optional so a
/// malformed row can be rejected instead of failing the whole load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorpusRow {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl CorpusRow {
    /// Converts the row into a document when question, answer and label are all present.
    pub fn into_document(self) -> Option<MedicalDocument> {
        let question = non_blank(self.question)?;
        let answer = non_blank(self.answer)?;
        let category = non_blank(self.label)?;
        Some(MedicalDocument {
            question,
            answer,
            category,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Where the documents of an index came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CorpusSource {
    Primary { path: String },
    Fallback,
}

impl fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusSource::Primary { path } => write!(f, "primary:{path}"),
            CorpusSource::Fallback => f.write_str("fallback"),
        }
    }
}
