//! Provider adapters: request builders and response extractors per vendor

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod openai_compat;
pub mod openrouter;
pub mod stub;
pub mod transport;

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use openai::OpenAiAdapter;
pub use openrouter::OpenRouterAdapter;
pub use stub::StubTransport;
pub use transport::HttpTransport;

use idea_validator_domain::{AnalyzeError, ProviderAdapter};
use serde::{Deserialize, Serialize};

/// Sampling settings shared by every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// One adapter per supported provider, using vendor base URLs
pub fn all_adapters(settings: &GenerationSettings) -> Vec<Box<dyn ProviderAdapter>> {
    vec![
        Box::new(GoogleAdapter::new(settings.clone())),
        Box::new(OpenAiAdapter::new(settings.clone())),
        Box::new(AnthropicAdapter::new(settings.clone())),
        Box::new(OpenRouterAdapter::new(settings.clone())),
    ]
}

/// Serialize a typed request body into the payload carried by `ProviderRequest`
pub(crate) fn to_payload<T: Serialize>(body: &T) -> Result<serde_json::Value, AnalyzeError> {
    serde_json::to_value(body)
        .map_err(|e| AnalyzeError::Configuration(format!("Failed to encode request: {}", e)))
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
