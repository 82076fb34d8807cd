//! Stub transport for testing and offline mode

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use idea_validator_domain::{ModelTransport, Provider, ProviderRequest, ResponseFormat, TransportError};
use serde_json::{Value, json};

/// Canned report returned by echo mode for analysis requests
const STUB_REPORT: &str = r#"{
  "summaryVerdict": "NeedsRefinement",
  "oneLineTakeaway": "Stub analysis: the idea is plausible but unvalidated.",
  "marketReality": "This report was produced by the stub provider without contacting any AI vendor.",
  "pros": ["Clear problem statement"],
  "cons": ["No evidence of demand yet"],
  "competitors": [{"name": "Status quo", "differentiation": "Manual workarounds"}],
  "monetizationStrategies": ["Subscription"],
  "whyPeoplePay": "It saves time on a recurring task.",
  "viabilityScore": 55,
  "nextSteps": ["Interview five target customers"]
}"#;

const STUB_CHAT_REPLY: &str = "Stub reply: configure a real AI provider for tailored answers.";

#[derive(Debug, Clone)]
enum Mode {
    Echo,
    Text(String),
    Error(TransportError),
}

/// Transport that answers locally with provider-shaped bodies
#[derive(Clone)]
pub struct StubTransport {
    mode: Mode,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl StubTransport {
    /// Canned report for analysis requests, canned reply for chat
    pub fn echo() -> Self {
        Self::with_mode(Mode::Echo)
    }

    /// Always answer with this model text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_mode(Mode::Text(text.into()))
    }

    /// Always fail with this error
    pub fn with_error(error: TransportError) -> Self {
        Self::with_mode(Mode::Error(error))
    }

    /// Wait before answering
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::echo()
    }
}

/// Wrap model text in the response body shape of a provider
pub fn envelope_for(provider: Provider, text: &str) -> Value {
    match provider {
        Provider::Google => json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }),
        Provider::Anthropic => json!({
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        }),
        Provider::OpenAI | Provider::OpenRouter => json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
        }),
    }
}

#[async_trait]
impl ModelTransport for StubTransport {
    async fn send(&self, request: ProviderRequest) -> Result<Value, TransportError> {
        tracing::debug!(provider = %request.provider, "Stub transport handling request");

        let provider = request.provider;
        let format = request.response_format;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.mode {
            Mode::Error(error) => Err(error.clone()),
            Mode::Text(text) => Ok(envelope_for(provider, text)),
            Mode::Echo => {
                let text = match format {
                    ResponseFormat::Json => STUB_REPORT,
                    ResponseFormat::Text => STUB_CHAT_REPLY,
                };
                Ok(envelope_for(provider, text))
            }
        }
    }
}
