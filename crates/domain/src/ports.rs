//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    AttachmentKind, BinaryAttachment, CanonicalRequest, OutboundEmail, PreparedContent, Provider,
    ProviderRequest, UserRecord, ValidationReport, WaitlistEntry,
};

/// Caller-facing failure of an analysis or chat attempt
#[derive(Debug, Clone, Error)]
pub enum AnalyzeError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("{provider} request failed: {message}")]
    Network { provider: Provider, message: String },
    #[error("{provider} did not respond within {seconds} seconds")]
    Timeout { provider: Provider, seconds: u64 },
    #[error("{0}")]
    MalformedOutput(String),
    #[error("Received empty response from {provider}")]
    EmptyOutput { provider: Provider },
}

/// Error type for the outbound HTTP call
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
    #[error("Invalid response body: {0}")]
    Body(String),
}

/// Port for sending a built provider request over the network
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Send the request and return the parsed JSON response body
    async fn send(&self, request: ProviderRequest) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: ModelTransport + ?Sized> ModelTransport for &T {
    async fn send(&self, request: ProviderRequest) -> Result<Value, TransportError> {
        (*self).send(request).await
    }
}

#[async_trait]
impl<T: ModelTransport + ?Sized> ModelTransport for Box<T> {
    async fn send(&self, request: ProviderRequest) -> Result<Value, TransportError> {
        (**self).send(request).await
    }
}

/// One implementation per provider: request building plus response unwrapping
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Whether a binary attachment of this kind can be sent to the provider
    fn supports_attachment(&self, kind: AttachmentKind) -> bool;

    /// Build the provider-shaped HTTP request
    fn build_request(&self, request: &CanonicalRequest) -> Result<ProviderRequest, AnalyzeError>;

    /// Pull the primary text output out of a response body, or "" if absent
    fn extract_text(&self, body: &Value) -> String;

    /// Validate credentials and attachment support, inlining text-like attachments
    fn prepare<'a>(
        &self,
        request: &'a CanonicalRequest,
    ) -> Result<PreparedContent<'a>, AnalyzeError> {
        if !request.has_api_key() {
            return Err(AnalyzeError::Configuration(format!(
                "API key for {} is empty",
                self.provider()
            )));
        }

        let Some(attachment) = request.attachment.as_ref() else {
            return Ok(PreparedContent {
                text: request.user_prompt.clone(),
                binary: None,
            });
        };

        let kind = attachment.kind();
        if kind == AttachmentKind::Text {
            let bytes = BASE64.decode(attachment.data.trim()).map_err(|e| {
                AnalyzeError::Configuration(format!("Attachment is not valid base64: {}", e))
            })?;
            let document = String::from_utf8_lossy(&bytes);
            let text = format!(
                "{}\n\nAttached document ({}):\n{}",
                request.user_prompt, attachment.mime_type, document
            );
            return Ok(PreparedContent { text, binary: None });
        }

        if !self.supports_attachment(kind) {
            return Err(AnalyzeError::Configuration(format!(
                "{} does not support {} attachments ({})",
                self.provider(),
                kind,
                attachment.mime_type
            )));
        }

        Ok(PreparedContent {
            text: request.user_prompt.clone(),
            binary: Some(BinaryAttachment {
                kind,
                mime_type: &attachment.mime_type,
                data: &attachment.data,
            }),
        })
    }
}

/// Error type for storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for user account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert or replace the user keyed by email
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError>;
}

/// Port for append-only report persistence
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn append_report(&self, email: &str, report: &ValidationReport)
    -> Result<(), StoreError>;

    /// Reports for a user, newest first
    async fn list_reports(&self, email: &str) -> Result<Vec<ValidationReport>, StoreError>;
}

/// Port for waitlist signups, keyed by email
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Insert the entry unless the email is already listed; returns whether it was added
    async fn add_to_waitlist(&self, entry: &WaitlistEntry) -> Result<bool, StoreError>;

    async fn waitlist_entry(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError>;

    async fn waitlist_len(&self) -> Result<u64, StoreError>;
}

/// Error type for outbound mail
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Port for the outbound-mail collaborator
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
