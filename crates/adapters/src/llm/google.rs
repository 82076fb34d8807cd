//! Google Gemini API adapter

use std::collections::BTreeMap;

use idea_validator_domain::{
    AnalyzeError, AttachmentKind, CanonicalRequest, Provider, ProviderAdapter, ProviderRequest,
    ResponseFormat,
};
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use super::{GenerationSettings, to_payload, trim_base_url};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` adapter
pub struct GoogleAdapter {
    base_url: String,
    settings: GenerationSettings,
}

impl GoogleAdapter {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            base_url: GOOGLE_BASE_URL.to_string(),
            settings,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    /// `generateContent` URL with the model and key percent-encoded
    fn endpoint(&self, model: &str, api_key: &str) -> Result<String, AnalyzeError> {
        let invalid = |reason: String| {
            AnalyzeError::Configuration(format!(
                "Invalid Google base URL '{}': {}",
                self.base_url, reason
            ))
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["v1beta", "models", &format!("{}:generateContent", model)]);
        url.query_pairs_mut().append_pair("key", api_key);

        Ok(url.into())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn supports_attachment(&self, kind: AttachmentKind) -> bool {
        matches!(kind, AttachmentKind::Image | AttachmentKind::Pdf)
    }

    fn build_request(&self, request: &CanonicalRequest) -> Result<ProviderRequest, AnalyzeError> {
        let prepared = self.prepare(request)?;

        let mut parts = vec![Part::Text {
            text: &prepared.text,
        }];
        if let Some(binary) = prepared.binary {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: binary.mime_type,
                    data: binary.data,
                },
            });
        }

        let body = GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part::Text {
                    text: &request.system_prompt,
                }],
            },
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
                response_mime_type: match request.response_format {
                    ResponseFormat::Json => Some("application/json"),
                    ResponseFormat::Text => None,
                },
            },
        };

        let endpoint = self.endpoint(&request.model, request.api_key.expose_secret().trim())?;

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(ProviderRequest {
            provider: Provider::Google,
            endpoint,
            headers,
            payload: to_payload(&body)?,
            response_format: request.response_format,
        })
    }

    fn extract_text(&self, body: &Value) -> String {
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}
