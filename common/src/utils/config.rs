use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    /// Explicit corpus CSV; when unset the default search paths are tried.
    #[serde(default)]
    pub corpus_path: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_generation_max_attempts")]
    pub generation_max_attempts: u32,
    #[serde(default = "default_generation_backoff_ms")]
    pub generation_backoff_ms: u64,
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
    #[serde(default = "default_debug_k")]
    pub debug_k: usize,
    #[serde(default = "default_tier_medium_floor")]
    pub tier_medium_floor: f32,
    #[serde(default = "default_tier_high_floor")]
    pub tier_high_floor: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            generation_model: default_generation_model(),
            corpus_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            generation_max_attempts: default_generation_max_attempts(),
            generation_backoff_ms: default_generation_backoff_ms(),
            retrieval_k: default_retrieval_k(),
            debug_k: default_debug_k(),
            tier_medium_floor: default_tier_medium_floor(),
            tier_high_floor: default_tier_high_floor(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_generation_max_attempts() -> u32 {
    3
}

const fn default_generation_backoff_ms() -> u64 {
    2_000
}

const fn default_retrieval_k() -> usize {
    3
}

const fn default_debug_k() -> usize {
    5
}

const fn default_tier_medium_floor() -> f32 {
    0.05
}

const fn default_tier_high_floor() -> f32 {
    0.10
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
