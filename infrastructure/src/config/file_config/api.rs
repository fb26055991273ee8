//! `[api]` section: DeepSeek endpoint, credentials and sampling defaults

use crate::deepseek::{API_KEY_ENV, DEFAULT_BASE_URL, DeepSeekConfig};
use deepseek_application::config::SamplingParams;
use deepseek_application::config::sampling::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileApiConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl Default for FileApiConfig {
    fn default() -> Self {
        Self {
            api_key_env: API_KEY_ENV.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 1000,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            top_p: None,
        }
    }
}

impl FileApiConfig {
    /// Client configuration with the key read from `api_key_env`.
    /// A missing key is left empty for the client to reject.
    pub fn to_deepseek_config(&self, env: impl Fn(&str) -> Option<String>) -> DeepSeekConfig {
        DeepSeekConfig::new(env(&self.api_key_env).unwrap_or_default())
            .with_base_url(self.base_url.trim_end_matches('/'))
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn sampling(&self) -> SamplingParams {
        let mut sampling = SamplingParams::default()
            .with_model(&self.default_model)
            .with_max_tokens(self.max_tokens);
        if let Some(t) = self.temperature {
            sampling = sampling.with_temperature(t);
        }
        if let Some(p) = self.top_p {
            sampling = sampling.with_top_p(p);
        }
        sampling
    }
}
