//! Analyze command - one-shot idea validation

use anyhow::{Context, Result, bail};
use idea_validator_adapters::outbox::OutboxMailer;
use idea_validator_domain::ValidationReport;
use idea_validator_domain::usecases::{
    AnalysisRequest, FallbackTier, report_email, send_best_effort,
};
use std::io::{self, Read};
use std::path::PathBuf;

use super::{build_analyzer, open_accounts, read_attachment};
use crate::args::AnalyzeArgs;
use crate::config::AppConfig;

pub async fn execute(args: AnalyzeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let idea = read_idea(&args)?;
    let attachment = args
        .attach
        .as_deref()
        .map(|path| read_attachment(path, args.mime.as_deref()))
        .transpose()?;

    if idea.is_none() && attachment.is_none() {
        bail!("Provide an idea with --idea or --file, or a file with --attach");
    }

    let (usecase, requested) = build_analyzer(&config, &args.provider, args.offline_fallback)?;

    // Refuse before spending a provider call on an account that cannot pay
    let accounts = match args.user.as_deref() {
        Some(email) => {
            let accounts = open_accounts(&config).await?;
            accounts
                .ensure_can_analyze(email)
                .await
                .context("Cannot analyze for this account")?;
            Some(accounts)
        }
        None => None,
    };

    tracing::info!(
        has_idea = idea.is_some(),
        has_attachment = attachment.is_some(),
        "Analyzing idea"
    );

    let outcome = usecase
        .analyze(AnalysisRequest {
            idea,
            attachment,
            provider: requested,
        })
        .await
        .context("Analysis failed")?;

    if let (Some(accounts), Some(email)) = (accounts.as_ref(), args.user.as_deref()) {
        let user = accounts
            .charge_and_save(email, &outcome.report)
            .await
            .context("Failed to save report")?;
        tracing::info!(email = %email, credits = user.credits, "Report saved to account");

        if args.notify {
            notify(&config, email, &outcome.report).await;
        }
    }

    if args.json {
        let json =
            serde_json::to_string_pretty(&outcome.report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&outcome.report, outcome.tier);
    }

    Ok(())
}

async fn notify(config: &AppConfig, email: &str, report: &ValidationReport) {
    match OutboxMailer::open(config.general.outbox_path.clone()).await {
        Ok(mailer) => {
            send_best_effort(&mailer, &report_email(email, report)).await;
        }
        Err(e) => {
            tracing::warn!(
                path = %config.general.outbox_path.display(),
                error = %e,
                "Failed to open mail outbox"
            );
        }
    }
}

fn read_idea(args: &AnalyzeArgs) -> Result<Option<String>> {
    let text = if let Some(ref idea) = args.idea {
        idea.clone()
    } else if let Some(ref path) = args.file {
        if path.as_os_str() == "-" {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            text
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?
        }
    } else {
        return Ok(None);
    };

    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

fn print_report(report: &ValidationReport, tier: FallbackTier) {
    let fields = &report.fields;

    println!("Idea Validation Report");
    println!("======================");
    println!();
    println!("Idea: {}", report.original_idea);
    println!(
        "Verdict: {} (viability {}/100)",
        fields.summary_verdict.label(),
        fields.viability_score
    );
    if tier != FallbackTier::Requested {
        println!("Source: {} provider", tier);
    }
    println!();
    println!("{}", fields.one_line_takeaway);
    println!();
    println!("Market reality:");
    println!("  {}", fields.market_reality);

    print_list("Pros", &fields.pros);
    print_list("Cons", &fields.cons);

    if !fields.competitors.is_empty() {
        println!();
        println!("Competitors:");
        for competitor in &fields.competitors {
            println!("  - {}: {}", competitor.name, competitor.differentiation);
        }
    }

    print_list("Monetization", &fields.monetization_strategies);

    println!();
    println!("Why people pay:");
    println!("  {}", fields.why_people_pay);

    print_list("Next steps", &fields.next_steps);
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}
