//! OpenRouter adapter (OpenAI-compatible, plus attribution headers)

use std::collections::BTreeMap;

use idea_validator_domain::{
    AnalyzeError, AttachmentKind, CanonicalRequest, Provider, ProviderAdapter, ProviderRequest,
};
use secrecy::ExposeSecret;
use serde_json::Value;

use super::openai_compat::{chat_completions_payload, extract_choice_text};
use super::{GenerationSettings, trim_base_url};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_REFERER: &str = "https://github.com/example/idea-validator";
pub const DEFAULT_TITLE: &str = "Idea Validator";

pub struct OpenRouterAdapter {
    base_url: String,
    referer: String,
    title: String,
    settings: GenerationSettings,
}

impl OpenRouterAdapter {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            settings,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    /// Override the `HTTP-Referer` / `X-Title` attribution headers
    pub fn with_attribution(mut self, referer: &str, title: &str) -> Self {
        self.referer = referer.to_string();
        self.title = title.to_string();
        self
    }
}

impl ProviderAdapter for OpenRouterAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenRouter
    }

    fn supports_attachment(&self, kind: AttachmentKind) -> bool {
        kind == AttachmentKind::Image
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<ProviderRequest, AnalyzeError> {
        let prepared = self.prepare(request)?;
        // Not every routed model accepts response_format
        let payload = chat_completions_payload(
            request,
            &prepared.text,
            prepared.binary,
            &self.settings,
            false,
        )?;

        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", request.api_key.expose_secret().trim()),
        );
        headers.insert("HTTP-Referer".to_string(), self.referer.clone());
        headers.insert("X-Title".to_string(), self.title.clone());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(ProviderRequest {
            provider: Provider::OpenRouter,
            endpoint: format!("{}/chat/completions", self.base_url),
            headers,
            payload,
            response_format: request.response_format,
        })
    }

    fn extract_text(&self, body: &Value) -> String {
        extract_choice_text(body)
    }
}
