//! JSONL outbox mailer: outbound emails are appended to a file for delivery elsewhere

use async_trait::async_trait;
use idea_validator_domain::model::OutboundEmail;
use idea_validator_domain::ports::{MailError, Mailer};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn new(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append<T: Serialize>(&self, entry: &T) -> Result<(), OutboxError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

/// Mailer that queues messages as outbox lines
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    writer: OutboxWriter,
}

impl OutboxMailer {
    pub fn new(writer: OutboxWriter) -> Self {
        Self { writer }
    }

    pub async fn open(path: PathBuf) -> Result<Self, OutboxError> {
        Ok(Self::new(OutboxWriter::new(path).await?))
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    queued_at: OffsetDateTime,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if email.to.trim().is_empty() {
            return Err(MailError::Delivery("recipient is empty".to_string()));
        }

        let entry = OutboxEntry {
            id: Uuid::new_v4(),
            queued_at: OffsetDateTime::now_utc(),
            to: &email.to,
            subject: &email.subject,
            html_body: &email.html_body,
        };

        self.writer
            .append(&entry)
            .await
            .map_err(|error| MailError::Delivery(format!("Outbox write failed: {}", error)))?;

        tracing::debug!(path = %self.writer.path().display(), to = %email.to, "Email queued");
        Ok(())
    }
}
