//! Doctor command - validate configuration and show status

use anyhow::Result;
use idea_validator_adapters::store::SqliteStore;
use idea_validator_domain::Provider;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::{AppConfig, ProviderChoice};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    provider: CheckResult,
    fallback: CheckResult,
    database: CheckResult,
    outbox: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, config_check) = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => (config, CheckResult::ok("Configuration loaded")),
        Err(e) => (
            AppConfig::default(),
            CheckResult::error(format!("Failed to load configuration: {:#}", e)),
        ),
    };

    let mut report = DoctorReport {
        config: config_check,
        provider: check_provider(&config),
        fallback: check_fallback(&config),
        database: check_database(&config).await,
        outbox: check_outbox(&config),
        overall: String::new(),
    };

    let checks = [
        &report.config,
        &report.provider,
        &report.fallback,
        &report.database,
        &report.outbox,
    ];
    let has_error = checks.iter().any(|c| c.status == "error");
    let all_ok = checks.iter().all(|c| c.status == "ok");

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_provider(config: &AppConfig) -> CheckResult {
    let provider = match config.default_choice() {
        Ok(ProviderChoice::Stub) => return CheckResult::ok("Provider: stub (offline)"),
        Ok(ProviderChoice::Vendor(provider)) => provider,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    let model = config
        .vendor(provider)
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());
    let env_var = config.api_key_env(provider);

    // Report presence of the key without revealing the value
    let key_set = std::env::var(&env_var)
        .map(|val| !val.trim().is_empty())
        .unwrap_or(false);

    let details = serde_json::json!({
        "keys": Provider::ALL
            .iter()
            .map(|p| {
                let env = config.api_key_env(*p);
                let set = std::env::var(&env).map(|v| !v.trim().is_empty()).unwrap_or(false);
                serde_json::json!({ "provider": p.name(), "env": env, "set": set })
            })
            .collect::<Vec<_>>()
    });

    let result = if key_set {
        CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            provider, model, env_var
        ))
    } else {
        CheckResult::warn(format!(
            "Provider: {}, Model: {}, API key: {} (not set)",
            provider, model, env_var
        ))
    };
    result.with_details(details)
}

fn check_fallback(config: &AppConfig) -> CheckResult {
    match config.fallback_policy(false) {
        Ok(policy) => {
            let tiers = policy
                .tiers()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            CheckResult::ok(format!("Tiers: {}", tiers.join(" -> ")))
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_database(config: &AppConfig) -> CheckResult {
    let path = &config.general.database_path;
    match SqliteStore::new(path).await {
        Ok(_) => CheckResult::ok(format!("Database: {}", path.display())),
        Err(e) => CheckResult::error(format!("Database {}: {}", path.display(), e)),
    }
}

fn check_outbox(config: &AppConfig) -> CheckResult {
    let path = &config.general.outbox_path;
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            CheckResult::warn(format!(
                "Outbox directory will be created on first email: {}",
                parent.display()
            ))
        }
        _ => CheckResult::ok(format!("Outbox: {}", path.display())),
    }
}

fn print_report(report: &DoctorReport) {
    println!("idea-validator Doctor Report");
    println!("============================");
    println!();

    print_check("Config", &report.config);
    print_check("Provider", &report.provider);
    print_check("Fallback", &report.fallback);
    print_check("Database", &report.database);
    print_check("Outbox", &report.outbox);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready! Try: idea-validator analyze --idea \"A marketplace for freelance chefs\"");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
