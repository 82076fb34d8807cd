//! Domain models and value objects

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ports::AnalyzeError;

/// A third-party generative-AI vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    OpenAI,
    Anthropic,
    OpenRouter,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Google,
        Provider::OpenAI,
        Provider::Anthropic,
        Provider::OpenRouter,
    ];

    /// Human-readable vendor name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    /// Model used when the caller does not pick one
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Google => "gemini-2.0-flash",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
            Provider::OpenRouter => "openai/gpt-4o-mini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown provider '{0}' (expected google, openai, anthropic or openrouter)")]
pub struct ParseProviderError(pub String);

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(Provider::Google),
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openrouter" => Ok(Provider::OpenRouter),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}

/// Broad media category of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
    Audio,
    /// Text-like documents (plain text, JSON, CSV, XML); always inlined into the prompt
    Text,
    Other,
}

impl AttachmentKind {
    pub fn from_mime(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("text/")
            || matches!(
                essence.as_str(),
                "application/json" | "application/csv" | "application/xml"
            )
            || essence.ends_with("+json")
            || essence.ends_with("+xml")
        {
            AttachmentKind::Text
        } else if essence.starts_with("image/") {
            AttachmentKind::Image
        } else if essence == "application/pdf" {
            AttachmentKind::Pdf
        } else if essence.starts_with("audio/") {
            AttachmentKind::Audio
        } else {
            AttachmentKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Text => "text",
            AttachmentKind::Other => "binary",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user-supplied file passed alongside the idea description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub mime_type: String,
    /// Base64-encoded file content
    pub data: String,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::from_mime(&self.mime_type)
    }
}

/// Whether the provider should be asked for structured JSON or free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
}

/// "Bring your own provider" selection supplied by a caller
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub api_key: Option<SecretString>,
}

impl ProviderConfig {
    pub fn new(provider: Provider, api_key: SecretString) -> Self {
        Self {
            provider: Some(provider),
            model: None,
            api_key: Some(api_key),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Provider-neutral description of a single model call
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub attachment: Option<Attachment>,
    pub provider: Provider,
    pub model: String,
    pub api_key: SecretString,
    pub response_format: ResponseFormat,
}

impl CanonicalRequest {
    /// Build a request from a provider selection, failing when no provider or key is set
    pub fn from_config(
        config: &ProviderConfig,
        system_prompt: String,
        user_prompt: String,
        attachment: Option<Attachment>,
        response_format: ResponseFormat,
    ) -> Result<Self, AnalyzeError> {
        let provider = config
            .provider
            .ok_or_else(|| AnalyzeError::Configuration("No AI provider selected".to_string()))?;

        let api_key = config.api_key.clone().ok_or_else(|| {
            AnalyzeError::Configuration(format!("No API key configured for {}", provider))
        })?;

        let model = config
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(provider.default_model())
            .to_string();

        Ok(Self {
            system_prompt,
            user_prompt,
            attachment,
            provider,
            model,
            api_key,
            response_format,
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

/// A binary attachment that must travel as a provider-specific content part
#[derive(Debug, Clone, Copy)]
pub struct BinaryAttachment<'a> {
    pub kind: AttachmentKind,
    pub mime_type: &'a str,
    pub data: &'a str,
}

/// Prompt text and binary payload after text attachments have been inlined
#[derive(Debug, Clone)]
pub struct PreparedContent<'a> {
    pub text: String,
    pub binary: Option<BinaryAttachment<'a>>,
}

/// A fully built HTTP call for one provider
#[derive(Clone)]
pub struct ProviderRequest {
    pub provider: Provider,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Value,
    pub response_format: ResponseFormat,
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Endpoint query strings and header values may carry credentials
        let endpoint = self.endpoint.split('?').next().unwrap_or_default();
        f.debug_struct("ProviderRequest")
            .field("provider", &self.provider)
            .field("endpoint", &endpoint)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("response_format", &self.response_format)
            .finish_non_exhaustive()
    }
}

/// Overall verdict on an idea
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Verdict {
    Promising,
    Risky,
    NeedsRefinement,
    #[default]
    Unknown,
}

impl Verdict {
    /// Case- and separator-insensitive match against the closed verdict set
    pub fn parse_lenient(raw: &str) -> Self {
        let folded: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "promising" => Verdict::Promising,
            "risky" => Verdict::Risky,
            "needsrefinement" => Verdict::NeedsRefinement,
            _ => Verdict::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Promising => "Promising",
            Verdict::Risky => "Risky",
            Verdict::NeedsRefinement => "Needs Refinement",
            Verdict::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A competing product and how the idea differs from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub differentiation: String,
}

/// The ten content fields of a validation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFields {
    pub summary_verdict: Verdict,
    pub one_line_takeaway: String,
    pub market_reality: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub competitors: Vec<Competitor>,
    pub monetization_strategies: Vec<String>,
    pub why_people_pay: String,
    /// 0-100
    pub viability_score: u8,
    pub next_steps: Vec<String>,
}

/// A finished, immutable analysis of one idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub original_idea: String,
    #[serde(flatten)]
    pub fields: ReportFields,
}

/// Conversation context for follow-up questions about a report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub original_idea: String,
    pub report: ValidationReport,
}

/// Verified identity returned by the OAuth collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    pub subject_id: String,
    pub email: String,
    pub name: String,
    pub picture_url: Option<String>,
}

/// A persisted user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub credits: u32,
    pub is_pro: bool,
    #[serde(default)]
    pub preferences: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Webhook payload from the payment collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub customer_email: String,
    pub plan_type: String,
    pub payment_status: String,
}

/// Someone who asked to hear about launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub email: String,
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// Message handed to the outbound-mail collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}
