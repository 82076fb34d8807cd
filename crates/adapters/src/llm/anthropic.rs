//! Anthropic Claude API adapter

use std::collections::BTreeMap;

use idea_validator_domain::{
    AnalyzeError, AttachmentKind, CanonicalRequest, Provider, ProviderAdapter, ProviderRequest,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use super::{GenerationSettings, to_payload, trim_base_url};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API adapter
pub struct AnthropicAdapter {
    base_url: String,
    settings: GenerationSettings,
}

impl AnthropicAdapter {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            base_url: ANTHROPIC_BASE_URL.to_string(),
            settings,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: Base64Source<'a> },
    Document { source: Base64Source<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct Base64Source<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn supports_attachment(&self, kind: AttachmentKind) -> bool {
        matches!(kind, AttachmentKind::Image | AttachmentKind::Pdf)
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<ProviderRequest, AnalyzeError> {
        let prepared = self.prepare(request)?;

        let mut content = Vec::with_capacity(2);
        if let Some(binary) = prepared.binary {
            let source = Base64Source {
                kind: "base64",
                media_type: binary.mime_type,
                data: binary.data,
            };
            content.push(match binary.kind {
                AttachmentKind::Pdf => ContentBlock::Document { source },
                _ => ContentBlock::Image { source },
            });
        }
        content.push(ContentBlock::Text {
            text: &prepared.text,
        });

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            system: &request.system_prompt,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        let mut headers = BTreeMap::new();
        headers.insert(
            "x-api-key".to_string(),
            request.api_key.expose_secret().trim().to_string(),
        );
        headers.insert(
            "anthropic-version".to_string(),
            ANTHROPIC_VERSION.to_string(),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(ProviderRequest {
            provider: Provider::Anthropic,
            endpoint: format!("{}/v1/messages", self.base_url),
            headers,
            payload: to_payload(&body)?,
            response_format: request.response_format,
        })
    }

    fn extract_text(&self, body: &Value) -> String {
        body.pointer("/content/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}
