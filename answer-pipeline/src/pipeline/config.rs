use std::time::Duration;

use common::utils::config::AppConfig;
use retrieval_pipeline::RetrievalConfig;

#[derive(Debug, Clone)]
pub struct AnswerTuning {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub request_timeout: Duration,
    /// Cleaned tiered replies shorter than this escalate to the directive prompt.
    pub min_answer_chars: usize,
    pub debug_k: usize,
}

impl Default for AnswerTuning {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            min_answer_chars: 30,
            debug_k: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnswerConfig {
    pub tuning: AnswerTuning,
    pub retrieval: RetrievalConfig,
}

impl AnswerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: AnswerTuning {
                max_attempts: config.generation_max_attempts.max(1),
                backoff: Duration::from_millis(config.generation_backoff_ms),
                request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
                debug_k: config.debug_k.max(1),
                ..AnswerTuning::default()
            },
            retrieval: RetrievalConfig::from_app_config(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_values_are_applied() {
        let app = AppConfig {
            generation_max_attempts: 0,
            generation_backoff_ms: 250,
            request_timeout_secs: 5,
            retrieval_k: 4,
            ..AppConfig::default()
        };

        let config = AnswerConfig::from_app_config(&app);
        assert_eq!(config.tuning.max_attempts, 1);
        assert_eq!(config.tuning.backoff, Duration::from_millis(250));
        assert_eq!(config.tuning.request_timeout, Duration::from_secs(5));
        assert_eq!(config.tuning.min_answer_chars, 30);
        assert_eq!(config.retrieval.tuning.take, 4);
    }

    #[test]
    fn defaults_match_app_defaults() {
        let from_app = AnswerConfig::from_app_config(&AppConfig::default());
        let default = AnswerConfig::default();
        assert_eq!(from_app.tuning.max_attempts, default.tuning.max_attempts);
        assert_eq!(from_app.tuning.backoff, default.tuning.backoff);
        assert_eq!(from_app.tuning.request_timeout, default.tuning.request_timeout);
        assert_eq!(from_app.retrieval.tuning.take, default.retrieval.tuning.take);
    }
}
