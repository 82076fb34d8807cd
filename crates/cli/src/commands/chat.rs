//! Chat command - follow-up questions about a saved report

use anyhow::{Context, Result};
use idea_validator_domain::{ChatContext, ValidationReport};
use std::path::PathBuf;

use super::build_analyzer;
use crate::args::ChatArgs;
use crate::config::AppConfig;

pub async fn execute(args: ChatArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let raw = std::fs::read_to_string(&args.report)
        .with_context(|| format!("Failed to read report: {}", args.report.display()))?;
    let report: ValidationReport = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid report JSON: {}", args.report.display()))?;

    let context = ChatContext {
        original_idea: report.original_idea.clone(),
        report,
    };

    // The offline tier never answers chat
    let (usecase, requested) = build_analyzer(&config, &args.provider, false)?;

    let reply = usecase
        .chat(&args.message, &context, requested.as_ref())
        .await
        .context("Chat failed")?;

    println!("{}", reply);
    Ok(())
}
