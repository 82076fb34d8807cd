//! Configuration loading and management

use anyhow::{Context, Result, bail};
use idea_validator_adapters::llm::{
    AnthropicAdapter, GenerationSettings, GoogleAdapter, OpenAiAdapter, OpenRouterAdapter,
};
use idea_validator_domain::usecases::{FallbackPolicy, FallbackTier};
use idea_validator_domain::{Provider, ProviderAdapter, ProviderConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub provider: ProviderSection,

    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_outbox_path")]
    pub outbox_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_starting_credits")]
    pub starting_credits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    /// google, openai, anthropic, openrouter, or stub
    #[serde(default = "default_provider")]
    pub default: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// HTTP client timeout, capped at the 90 second per-call bound
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub google: VendorConfig,

    #[serde(default)]
    pub openai: VendorConfig,

    #[serde(default)]
    pub anthropic: VendorConfig,

    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

/// Per-vendor settings; empty values fall back to the vendor defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorConfig {
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(flatten)]
    pub vendor: VendorConfig,

    #[serde(default = "default_openrouter_referer")]
    pub referer: String,

    #[serde(default = "default_openrouter_title")]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_tiers")]
    pub tiers: Vec<String>,

    /// Append the offline tier after the configured tiers
    #[serde(default)]
    pub offline: bool,
}

/// Where the default tier's answers come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    Vendor(Provider),
    /// Local stub transport, no network
    Stub,
}

impl ProviderChoice {
    pub fn parse(name: &str) -> Result<Self> {
        if name.trim().eq_ignore_ascii_case("stub") {
            return Ok(ProviderChoice::Stub);
        }
        let provider = name
            .parse::<Provider>()
            .with_context(|| format!("Invalid provider '{}'", name))?;
        Ok(ProviderChoice::Vendor(provider))
    }
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("./idea-validator.sqlite")
}

fn default_outbox_path() -> PathBuf {
    PathBuf::from("./outbox.jsonl")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_starting_credits() -> u32 {
    3
}

fn default_provider() -> String {
    "google".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_timeout() -> u64 {
    90
}

fn default_openrouter_referer() -> String {
    idea_validator_adapters::llm::openrouter::DEFAULT_REFERER.to_string()
}

fn default_openrouter_title() -> String {
    idea_validator_adapters::llm::openrouter::DEFAULT_TITLE.to_string()
}

fn default_tiers() -> Vec<String> {
    vec!["requested".to_string(), "default".to_string()]
}

/// Env var holding the API key when none is configured
pub fn default_api_key_env(provider: Provider) -> &'static str {
    match provider {
        Provider::Google => "GEMINI_API_KEY",
        Provider::OpenAI => "OPENAI_API_KEY",
        Provider::Anthropic => "ANTHROPIC_API_KEY",
        Provider::OpenRouter => "OPENROUTER_API_KEY",
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            outbox_path: default_outbox_path(),
            log_level: default_log_level(),
            starting_credits: default_starting_credits(),
        }
    }
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            default: default_provider(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout(),
            google: VendorConfig::default(),
            openai: VendorConfig::default(),
            anthropic: VendorConfig::default(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            vendor: VendorConfig::default(),
            referer: default_openrouter_referer(),
            title: default_openrouter_title(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            offline: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("IDEA_VALIDATOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn vendor(&self, provider: Provider) -> &VendorConfig {
        match provider {
            Provider::Google => &self.provider.google,
            Provider::OpenAI => &self.provider.openai,
            Provider::Anthropic => &self.provider.anthropic,
            Provider::OpenRouter => &self.provider.openrouter.vendor,
        }
    }

    pub fn default_choice(&self) -> Result<ProviderChoice> {
        ProviderChoice::parse(&self.provider.default)
    }

    /// Env var name holding the API key for a provider
    pub fn api_key_env(&self, provider: Provider) -> String {
        non_empty(self.vendor(provider).api_key_env.as_deref())
            .unwrap_or_else(|| default_api_key_env(provider).to_string())
    }

    /// Provider selection with the key read from the environment
    ///
    /// A missing key is left unset so the analysis reports it as a
    /// configuration error naming the provider.
    pub fn provider_config(
        &self,
        provider: Provider,
        model: Option<&str>,
        api_key_env: Option<&str>,
    ) -> ProviderConfig {
        let env_var = non_empty(api_key_env).unwrap_or_else(|| self.api_key_env(provider));
        let api_key = std::env::var(&env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| SecretString::new(key.into()));

        if api_key.is_none() {
            tracing::debug!(provider = %provider, env_var = %env_var, "API key env var not set");
        }

        ProviderConfig {
            provider: Some(provider),
            model: non_empty(model).or_else(|| non_empty(self.vendor(provider).model.as_deref())),
            api_key,
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.provider.temperature,
            max_output_tokens: self.provider.max_output_tokens,
        }
    }

    /// Adapters for every provider, honoring configured base URLs
    pub fn adapters(&self) -> Vec<Box<dyn ProviderAdapter>> {
        let settings = self.generation_settings();

        let mut google = GoogleAdapter::new(settings.clone());
        if let Some(url) = non_empty(self.provider.google.base_url.as_deref()) {
            google = google.with_base_url(&url);
        }

        let mut openai = OpenAiAdapter::new(settings.clone());
        if let Some(url) = non_empty(self.provider.openai.base_url.as_deref()) {
            openai = openai.with_base_url(&url);
        }

        let mut anthropic = AnthropicAdapter::new(settings.clone());
        if let Some(url) = non_empty(self.provider.anthropic.base_url.as_deref()) {
            anthropic = anthropic.with_base_url(&url);
        }

        let openrouter_config = &self.provider.openrouter;
        let mut openrouter = OpenRouterAdapter::new(settings)
            .with_attribution(&openrouter_config.referer, &openrouter_config.title);
        if let Some(url) = non_empty(openrouter_config.vendor.base_url.as_deref()) {
            openrouter = openrouter.with_base_url(&url);
        }

        vec![
            Box::new(google),
            Box::new(openai),
            Box::new(anthropic),
            Box::new(openrouter),
        ]
    }

    /// Fallback tiers, optionally forcing the offline tier on
    pub fn fallback_policy(&self, force_offline: bool) -> Result<FallbackPolicy> {
        let tiers = self
            .fallback
            .tiers
            .iter()
            .map(|tier| tier.parse::<FallbackTier>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?;

        if tiers.is_empty() {
            bail!("fallback.tiers must name at least one tier");
        }

        let policy = FallbackPolicy::new(tiers);
        if self.fallback.offline || force_offline {
            Ok(policy.with_offline())
        } else {
            Ok(policy)
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# idea-validator configuration

[general]
database_path = "./idea-validator.sqlite"
outbox_path = "./outbox.jsonl"
log_level = "info"
# Credits granted to a newly signed-in user
starting_credits = 3

[provider]
default = "google"  # google, openai, anthropic, openrouter, stub
temperature = 0.7
max_output_tokens = 2048
# HTTP client timeout; values above 90 are capped at 90
timeout_secs = 90

[provider.google]
model = "gemini-2.0-flash"
api_key_env = "GEMINI_API_KEY"
# base_url = "https://generativelanguage.googleapis.com"

[provider.openai]
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
# base_url = "https://api.openai.com/v1"

[provider.anthropic]
model = "claude-3-5-sonnet-latest"
api_key_env = "ANTHROPIC_API_KEY"
# base_url = "https://api.anthropic.com"

[provider.openrouter]
model = "openai/gpt-4o-mini"
api_key_env = "OPENROUTER_API_KEY"
referer = "https://github.com/example/idea-validator"
title = "Idea Validator"

[fallback]
# Tried in order: requested (per-call provider), default (the provider above)
tiers = ["requested", "default"]
# Serve a canned report when every tier fails
offline = false
"#
        .to_string()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(config.general.starting_credits, 3);
        assert_eq!(config.default_choice().unwrap(), ProviderChoice::Vendor(Provider::Google));
        assert_eq!(config.provider.timeout_secs, 90);
        assert_eq!(config.provider.openrouter.title, "Idea Validator");
        assert_eq!(
            config.provider.openrouter.vendor.model.as_deref(),
            Some("openai/gpt-4o-mini")
        );
        assert_eq!(
            config.fallback_policy(false).unwrap(),
            FallbackPolicy::default()
        );
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::default();
        assert_eq!(config.api_key_env(Provider::Anthropic), "ANTHROPIC_API_KEY");
        assert_eq!(config.api_key_env(Provider::OpenRouter), "OPENROUTER_API_KEY");
        assert_eq!(config.adapters().len(), 4);
    }

    #[test]
    fn test_provider_choice_parsing() {
        assert_eq!(ProviderChoice::parse("Stub").unwrap(), ProviderChoice::Stub);
        assert_eq!(
            ProviderChoice::parse("claude").unwrap(),
            ProviderChoice::Vendor(Provider::Anthropic)
        );
        assert!(ProviderChoice::parse("mistral").is_err());
    }

    #[test]
    fn test_fallback_policy_from_config() {
        let mut config = AppConfig::default();
        config.fallback.tiers = vec!["default".to_string()];

        let policy = config.fallback_policy(true).unwrap();
        assert_eq!(policy.tiers(), &[FallbackTier::Default, FallbackTier::Offline]);

        config.fallback.tiers = vec!["sometimes".to_string()];
        assert!(config.fallback_policy(false).is_err());

        config.fallback.tiers.clear();
        assert!(config.fallback_policy(false).is_err());
    }

    #[test]
    fn test_provider_config_uses_vendor_model_and_missing_key() {
        let mut config = AppConfig::default();
        config.provider.openai.model = Some("gpt-4o".to_string());

        let selection = config.provider_config(
            Provider::OpenAI,
            None,
            Some("IDEA_VALIDATOR_TEST_KEY_THAT_IS_NEVER_SET"),
        );
        assert_eq!(selection.provider, Some(Provider::OpenAI));
        assert_eq!(selection.model.as_deref(), Some("gpt-4o"));
        assert!(selection.api_key.is_none());

        let overridden = config.provider_config(Provider::OpenAI, Some("o3-mini"), None);
        assert_eq!(overridden.model.as_deref(), Some("o3-mini"));
    }
}
