//! OpenAI API adapter

use std::collections::BTreeMap;

use idea_validator_domain::{
    AnalyzeError, AttachmentKind, CanonicalRequest, Provider, ProviderAdapter, ProviderRequest,
};
use secrecy::ExposeSecret;
use serde_json::Value;

use super::openai_compat::{chat_completions_payload, extract_choice_text};
use super::{GenerationSettings, trim_base_url};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI Chat Completions adapter
pub struct OpenAiAdapter {
    base_url: String,
    settings: GenerationSettings,
}

impl OpenAiAdapter {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            settings,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn supports_attachment(&self, kind: AttachmentKind) -> bool {
        kind == AttachmentKind::Image
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<ProviderRequest, AnalyzeError> {
        let prepared = self.prepare(request)?;
        let payload = chat_completions_payload(
            request,
            &prepared.text,
            prepared.binary,
            &self.settings,
            true,
        )?;

        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", request.api_key.expose_secret().trim()),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(ProviderRequest {
            provider: Provider::OpenAI,
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
