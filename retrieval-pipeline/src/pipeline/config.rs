use common::utils::config::AppConfig;
use serde::{Deserialize, Serialize};

/// Tunable parameters that govern candidate selection and thresholding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTuning {
    /// Number of candidates considered per query.
    #[serde(default = "default_take")]
    pub take: usize,
    /// Similarity a candidate must reach when the best match is strong.
    #[serde(default = "default_base_threshold")]
    pub base_threshold: f32,
    /// Lowest value the adaptive threshold may drop to.
    #[serde(default = "default_adaptive_floor")]
    pub adaptive_floor: f32,
    /// Fraction of the best similarity used as threshold when the best match is weak.
    #[serde(default = "default_adaptive_ratio")]
    pub adaptive_ratio: f32,
    /// The single best candidate is still returned when it exceeds this value.
    #[serde(default = "default_noise_floor")]
    pub noise_floor: f32,
}

impl Default for RetrievalTuning {
    fn default() -> Self {
        Self {
            take: default_take(),
            base_threshold: default_base_threshold(),
            adaptive_floor: default_adaptive_floor(),
            adaptive_ratio: default_adaptive_ratio(),
            noise_floor: default_noise_floor(),
        }
    }
}

/// Parameters for fitting the term-weighted vector space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerConfig {
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub max_features: usize,
    /// Terms present in more than this fraction of documents are dropped.
    pub max_df: f32,
    pub min_df: usize,
    pub sublinear_tf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_min: 1,
            ngram_max: 3,
            max_features: 2000,
            max_df: 0.95,
            min_df: 1,
            sublinear_tf: true,
        }
    }
}

/// Lower bounds (inclusive) of the MEDIUM and HIGH confidence tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    pub medium_floor: f32,
    pub high_floor: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium_floor: 0.05,
            high_floor: 0.10,
        }
    }
}

/// Wrapper bundling retrieval, vectorizer and tier policy.
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfig {
    pub tuning: RetrievalTuning,
    pub vectorizer: VectorizerConfig,
    pub tiers: TierThresholds,
}

impl RetrievalConfig {
    /// Applies the overrides exposed through application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: RetrievalTuning {
                take: config.retrieval_k.max(1),
                ..RetrievalTuning::default()
            },
            vectorizer: VectorizerConfig::default(),
            tiers: TierThresholds {
                medium_floor: config.tier_medium_floor,
                high_floor: config.tier_high_floor,
            },
        }
    }
}

const fn default_take() -> usize {
    3
}

const fn default_base_threshold() -> f32 {
    0.10
}

const fn default_adaptive_floor() -> f32 {
    0.01
}

const fn default_adaptive_ratio() -> f32 {
    0.5
}

const fn default_noise_floor() -> f32 {
    0.001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_overrides_take_and_tiers() {
        let app = AppConfig {
            retrieval_k: 0,
            tier_medium_floor: 0.2,
            tier_high_floor: 0.4,
            ..AppConfig::default()
        };

        let config = RetrievalConfig::from_app_config(&app);
        assert_eq!(config.tuning.take, 1);
        assert!((config.tiers.medium_floor - 0.2).abs() < f32::EPSILON);
        assert!((config.tiers.high_floor - 0.4).abs() < f32::EPSILON);
        assert!((config.tuning.base_threshold - 0.10).abs() < f32::EPSILON);
    }

    #[test]
    fn tuning_deserializes_partial_overrides() {
        let tuning: RetrievalTuning =
            serde_json::from_str(r#"{"base_threshold": 0.2}"#).expect("valid tuning");
        assert!((tuning.base_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(tuning.take, 3);
        assert!((tuning.noise_floor - 0.001).abs() < f32::EPSILON);
    }
}
