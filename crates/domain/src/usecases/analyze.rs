//! Analysis use case
//!
//! Sequences provider selection, request building, the bounded network call,
//! text extraction, JSON recovery, field normalization and report assembly.
//! Provider selection walks an explicit [`FallbackPolicy`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use uuid::Uuid;

use crate::assemble::assemble_report;
use crate::model::{
    Attachment, CanonicalRequest, ChatContext, Provider, ProviderConfig, ResponseFormat,
    ValidationReport,
};
use crate::normalize::normalize_fields;
use crate::ports::{
    AnalyzeError, Clock, ModelTransport, ProviderAdapter, SystemClock, TransportError,
};
use crate::prompts::{ANALYSIS_SYSTEM_PROMPT, analysis_user_prompt, chat_system_prompt};
use crate::recovery::{excerpt, parse_recovered};

/// Upper bound on a single provider call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Longest provider diagnostic quoted in a network error
const MAX_DIAGNOSTIC_CHARS: usize = 500;

/// A source of analysis, tried in policy order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTier {
    /// The caller's own provider configuration
    Requested,
    /// The server's configured default provider
    Default,
    /// A canned report produced without any network call
    Offline,
}

impl fmt::Display for FallbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackTier::Requested => "requested",
            FallbackTier::Default => "default",
            FallbackTier::Offline => "offline",
        })
    }
}

impl FromStr for FallbackTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requested" => Ok(FallbackTier::Requested),
            "default" => Ok(FallbackTier::Default),
            "offline" => Ok(FallbackTier::Offline),
            other => Err(format!("Unknown fallback tier: {}", other)),
        }
    }
}

/// Ordered list of tiers the orchestrator tries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    tiers: Vec<FallbackTier>,
}

impl FallbackPolicy {
    pub fn new(tiers: Vec<FallbackTier>) -> Self {
        Self { tiers }
    }

    /// Append the offline tier if it is not already present
    pub fn with_offline(mut self) -> Self {
        if !self.tiers.contains(&FallbackTier::Offline) {
            self.tiers.push(FallbackTier::Offline);
        }
        self
    }

    pub fn tiers(&self) -> &[FallbackTier] {
        &self.tiers
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(vec![FallbackTier::Requested, FallbackTier::Default])
    }
}

/// Configuration for the analyze use case
#[derive(Debug, Clone, Default)]
pub struct AnalyzeConfig {
    /// Provider used by the `Default` tier
    pub default_provider: ProviderConfig,
    pub policy: FallbackPolicy,
}

/// One caller request to analyze an idea
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub idea: Option<String>,
    pub attachment: Option<Attachment>,
    /// Bring-your-own provider configuration
    pub provider: Option<ProviderConfig>,
}

/// A finished analysis and the tier that produced it
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: ValidationReport,
    pub tier: FallbackTier,
}

/// Use case for analyzing ideas and chatting about the results
pub struct AnalyzeUseCase<T> {
    transport: T,
    adapters: Vec<Box<dyn ProviderAdapter>>,
    clock: Arc<dyn Clock>,
    config: AnalyzeConfig,
}

impl<T: ModelTransport> AnalyzeUseCase<T> {
    pub fn new(transport: T, adapters: Vec<Box<dyn ProviderAdapter>>, config: AnalyzeConfig) -> Self {
        Self {
            transport,
            adapters,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Produce a validation report for an idea and/or attachment
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalyzeError> {
        let has_idea = request
            .idea
            .as_deref()
            .is_some_and(|idea| !idea.trim().is_empty());
        if !has_idea && request.attachment.is_none() {
            return Err(AnalyzeError::Configuration(
                "Provide an idea description or an attachment to analyze".to_string(),
            ));
        }

        let mut last_error = None;
        for &tier in self.config.policy.tiers() {
            if tier == FallbackTier::Offline {
                tracing::info!(tier = %tier, "Serving offline analysis");
                return Ok(AnalysisOutcome {
                    report: self.offline_report(&request),
                    tier,
                });
            }

            let Some(provider_config) = self.tier_config(tier, request.provider.as_ref()) else {
                tracing::debug!(tier = %tier, "No provider configured for tier, skipping");
                continue;
            };

            tracing::info!(
                tier = %tier,
                provider = ?provider_config.provider,
                "Analysis tier activated"
            );

            match self.analyze_with(provider_config, &request).await {
                Ok(report) => {
                    tracing::info!(
                        tier = %tier,
                        report_id = %report.id,
                        verdict = %report.fields.summary_verdict,
                        score = report.fields.viability_score,
                        "Analysis completed"
                    );
                    return Ok(AnalysisOutcome { report, tier });
                }
                Err(error) => {
                    if let Some(error) = self.stop_on(tier, error, &mut last_error) {
                        return Err(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(no_provider_error))
    }

    /// Answer a follow-up question about an existing report
    pub async fn chat(
        &self,
        message: &str,
        context: &ChatContext,
        provider: Option<&ProviderConfig>,
    ) -> Result<String, AnalyzeError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AnalyzeError::Configuration(
                "Chat message is empty".to_string(),
            ));
        }

        let system_prompt = chat_system_prompt(context);

        let mut last_error = None;
        for &tier in self.config.policy.tiers() {
            let Some(provider_config) = self.tier_config(tier, provider) else {
                continue;
            };

            tracing::info!(tier = %tier, provider = ?provider_config.provider, "Chat tier activated");

            let result = match CanonicalRequest::from_config(
                provider_config,
                system_prompt.clone(),
                message.to_string(),
                None,
                ResponseFormat::Text,
            ) {
                Ok(request) => self.complete(&request).await,
                Err(error) => Err(error),
            };

            match result {
                Ok(reply) => return Ok(reply.trim().to_string()),
                Err(error) => {
                    if let Some(error) = self.stop_on(tier, error, &mut last_error) {
                        return Err(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(no_provider_error))
    }

    /// Provider configuration for a tier; `None` when the tier has nothing to call
    fn tier_config<'a>(
        &'a self,
        tier: FallbackTier,
        requested: Option<&'a ProviderConfig>,
    ) -> Option<&'a ProviderConfig> {
        match tier {
            FallbackTier::Requested => requested,
            FallbackTier::Default => Some(&self.config.default_provider),
            FallbackTier::Offline => None,
        }
    }

    /// Record a tier failure; returns the error when it must end the walk
    fn stop_on(
        &self,
        tier: FallbackTier,
        error: AnalyzeError,
        last_error: &mut Option<AnalyzeError>,
    ) -> Option<AnalyzeError> {
        // The caller's own misconfiguration is never masked by later tiers
        if tier == FallbackTier::Requested && matches!(error, AnalyzeError::Configuration(_)) {
            tracing::warn!(tier = %tier, error = %error, "Requested provider is misconfigured");
            return Some(error);
        }

        // A timed-out call is terminal for the request; no other provider is tried
        if matches!(error, AnalyzeError::Timeout { .. }) {
            tracing::warn!(tier = %tier, error = %error, "Provider timed out, ending request");
            return Some(error);
        }

        tracing::warn!(tier = %tier, error = %error, "Tier failed");
        *last_error = Some(error);
        None
    }

    async fn analyze_with(
        &self,
        provider_config: &ProviderConfig,
        request: &AnalysisRequest,
    ) -> Result<ValidationReport, AnalyzeError> {
        let canonical = CanonicalRequest::from_config(
            provider_config,
            ANALYSIS_SYSTEM_PROMPT.to_string(),
            analysis_user_prompt(request.idea.as_deref(), request.attachment.is_some()),
            request.attachment.clone(),
            ResponseFormat::Json,
        )?;

        let text = self.complete(&canonical).await?;
        let value = parse_recovered(&text)?;
        let fields = normalize_fields(&value);

        tracing::debug!(provider = %canonical.provider, "Normalized model output");

        Ok(assemble_report(
            fields,
            request.idea.as_deref(),
            Uuid::new_v4(),
            self.clock.now(),
        ))
    }

    /// Build, send and unwrap one provider call
    async fn complete(&self, request: &CanonicalRequest) -> Result<String, AnalyzeError> {
        let provider = request.provider;
        let adapter = self.adapter_for(provider)?;
        let http_request = adapter.build_request(request)?;

        tracing::debug!(
            provider = %provider,
            model = %request.model,
            "Sending provider request"
        );

        let started = Instant::now();
        // Dropping the send future on expiry aborts the in-flight call
        let body = match tokio::time::timeout(REQUEST_TIMEOUT, self.transport.send(http_request))
            .await
        {
            Ok(Ok(body)) => body,
            Ok(Err(error)) => return Err(transport_failure(provider, error)),
            Err(_) => {
                tracing::warn!(provider = %provider, "Provider call timed out, cancelled");
                return Err(AnalyzeError::Timeout {
                    provider,
                    seconds: REQUEST_TIMEOUT.as_secs(),
                });
            }
        };

        tracing::debug!(
            provider = %provider,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Provider response received"
        );

        let text = adapter.extract_text(&body);
        if text.trim().is_empty() {
            return Err(AnalyzeError::EmptyOutput { provider });
        }

        Ok(text)
    }

    fn adapter_for(&self, provider: Provider) -> Result<&dyn ProviderAdapter, AnalyzeError> {
        self.adapters
            .iter()
            .find(|adapter| adapter.provider() == provider)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| {
                AnalyzeError::Configuration(format!("{} is not available on this server", provider))
            })
    }

    fn offline_report(&self, request: &AnalysisRequest) -> ValidationReport {
        let fields = normalize_fields(&json!({
            "summaryVerdict": "NeedsRefinement",
            "oneLineTakeaway": "Offline analysis: connect an AI provider for a report tailored to this idea.",
            "marketReality": "No market data could be retrieved, so this report lists generic checks that apply to most early-stage ideas.",
            "pros": ["You have a concrete idea to test"],
            "cons": ["Demand has not been validated yet", "The competitive landscape is unknown"],
            "competitors": [],
            "monetizationStrategies": ["Subscription", "Usage-based pricing"],
            "whyPeoplePay": "Customers pay when the product removes a costly or frequent pain.",
            "viabilityScore": 50,
            "nextSteps": [
                "Interview ten potential customers",
                "List the three closest alternatives they use today",
                "Run the analysis again with an AI provider configured"
            ]
        }));

        assemble_report(
            fields,
            request.idea.as_deref(),
            Uuid::new_v4(),
            self.clock.now(),
        )
    }
}

fn no_provider_error() -> AnalyzeError {
    AnalyzeError::Configuration("No AI provider is configured".to_string())
}

fn transport_failure(provider: Provider, error: TransportError) -> AnalyzeError {
    match error {
        TransportError::Timeout { seconds } => AnalyzeError::Timeout { provider, seconds },
        TransportError::Status {
            status,
            reason,
            body,
        } => AnalyzeError::Network {
            provider,
            message: format!("HTTP {}: {}", status, describe_error_envelope(&reason, &body)),
        },
        TransportError::Network(message) => AnalyzeError::Network { provider, message },
        TransportError::Body(message) => AnalyzeError::Network {
            provider,
            message: format!("unreadable response body: {}", message),
        },
    }
}

/// Best-effort human-readable message from a provider error response
///
/// Tries `error.message`, `error` and `message`, appending any
/// `error.metadata.raw` diagnostic; falls back to the raw body, then to the
/// status reason phrase.
pub fn describe_error_envelope(status_reason: &str, body: &str) -> String {
    let trimmed = body.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = envelope_message(&value) {
            return match envelope_raw(&value) {
                Some(raw) => format!("{} ({})", message, raw),
                None => message,
            };
        }
    }

    if !trimmed.is_empty() {
        return excerpt(trimmed, MAX_DIAGNOSTIC_CHARS);
    }

    status_reason.to_string()
}

fn envelope_message(value: &Value) -> Option<String> {
    let error = value.get("error");

    error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

fn envelope_raw(value: &Value) -> Option<String> {
    let raw = match value.pointer("/error/metadata/raw")? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    (!raw.is_empty()).then(|| excerpt(&raw, MAX_DIAGNOSTIC_CHARS))
}
