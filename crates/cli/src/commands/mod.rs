//! Subcommand implementations and the wiring they share

pub mod account;
pub mod analyze;
pub mod chat;
pub mod config;
pub mod doctor;
pub mod waitlist;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use idea_validator_adapters::llm::{HttpTransport, StubTransport};
use idea_validator_adapters::store::SqliteStore;
use idea_validator_domain::usecases::{AccountsConfig, AccountsUseCase, AnalyzeConfig, AnalyzeUseCase};
use idea_validator_domain::{Attachment, ModelTransport, Provider, ProviderConfig};
use secrecy::SecretString;
use std::path::Path;
use std::time::Duration;

use crate::args::ProviderArgs;
use crate::config::{AppConfig, ProviderChoice};

pub(crate) type Analyzer = AnalyzeUseCase<Box<dyn ModelTransport>>;

/// Build the analyze use case and the caller's requested provider, if any
///
/// Choosing `stub` as either the default or the requested provider routes
/// the whole invocation through the local stub transport.
pub(crate) fn build_analyzer(
    config: &AppConfig,
    provider_args: &ProviderArgs,
    force_offline: bool,
) -> Result<(Analyzer, Option<ProviderConfig>)> {
    let default_choice = config.default_choice()?;
    let requested_choice = provider_args
        .provider
        .as_deref()
        .map(ProviderChoice::parse)
        .transpose()?;

    let use_stub =
        default_choice == ProviderChoice::Stub || requested_choice == Some(ProviderChoice::Stub);

    let transport: Box<dyn ModelTransport> = if use_stub {
        tracing::info!("Using stub transport, no provider will be contacted");
        Box::new(StubTransport::echo())
    } else {
        Box::new(
            HttpTransport::new(Duration::from_secs(config.provider.timeout_secs))
                .context("Failed to create HTTP transport")?,
        )
    };

    let default_provider = match default_choice {
        ProviderChoice::Vendor(provider) => config.provider_config(provider, None, None),
        ProviderChoice::Stub => stub_provider_config(),
    };

    let requested = requested_choice.map(|choice| match choice {
        ProviderChoice::Vendor(provider) => config.provider_config(
            provider,
            provider_args.model.as_deref(),
            provider_args.api_key_env.as_deref(),
        ),
        ProviderChoice::Stub => stub_provider_config(),
    });

    let analyze_config = AnalyzeConfig {
        default_provider,
        policy: config.fallback_policy(force_offline)?,
    };

    let usecase = AnalyzeUseCase::new(transport, config.adapters(), analyze_config);
    Ok((usecase, requested))
}

fn stub_provider_config() -> ProviderConfig {
    ProviderConfig::new(Provider::Google, SecretString::new("stub".into()))
}

pub(crate) async fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    SqliteStore::new(&config.general.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database: {}",
                config.general.database_path.display()
            )
        })
}

pub(crate) async fn open_accounts(config: &AppConfig) -> Result<AccountsUseCase<SqliteStore>> {
    Ok(AccountsUseCase::new(
        open_store(config).await?,
        AccountsConfig {
            starting_credits: config.general.starting_credits,
        },
    ))
}

/// Read a file as a base64 attachment
pub(crate) fn read_attachment(path: &Path, mime: Option<&str>) -> Result<Attachment> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read attachment: {}", path.display()))?;

    let mime_type = mime
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| guess_mime(path).to_string());

    tracing::debug!(
        path = %path.display(),
        mime = %mime_type,
        bytes = bytes.len(),
        "Loaded attachment"
    );

    Ok(Attachment::new(mime_type, BASE64.encode(bytes)))
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}
