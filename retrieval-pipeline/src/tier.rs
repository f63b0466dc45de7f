use std::fmt;

use serde::Serialize;

use crate::{pipeline::TierThresholds, RetrievedDocument};

/// How far the generated answer should lean on retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Tier for a top similarity. Lower bounds are inclusive.
    pub fn from_similarity(similarity: f32, thresholds: &TierThresholds) -> Self {
        if similarity >= thresholds.high_floor {
            Self::High
        } else if similarity >= thresholds.medium_floor {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Tier for a ranked match list; no matches means `Low`.
    pub fn select(matches: &[RetrievedDocument], thresholds: &TierThresholds) -> Self {
        matches
            .first()
            .map_or(Self::Low, |top| Self::from_similarity(top.similarity, thresholds))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
