//! Account command - sign-in, payments, and account status

use anyhow::{Context, Result};
use idea_validator_domain::{IdentityProfile, PaymentEvent};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::open_accounts;
use crate::args::{AccountArgs, AccountCommands};
use crate::config::AppConfig;

pub async fn execute(args: AccountArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let accounts = open_accounts(&config).await?;

    match args.command {
        AccountCommands::Show { email, json } => {
            let user = accounts
                .get_user(&email)
                .await?
                .with_context(|| format!("No account found for {}", email))?;
            let reports = accounts.reports(&email).await?;

            if json {
                let value = serde_json::json!({ "user": user, "reports": reports });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{} <{}>", user.name, user.email);
                if user.is_pro {
                    println!("Plan: pro");
                } else {
                    println!("Credits: {}", user.credits);
                }
                println!("Reports: {}", reports.len());
                for report in &reports {
                    println!(
                        "  - {} [{} {}/100] {}",
                        report.id,
                        report.fields.summary_verdict.label(),
                        report.fields.viability_score,
                        report.original_idea
                    );
                }
            }
        }
        AccountCommands::SignIn { profile } => {
            let profile: IdentityProfile = read_json(&profile)?;
            let user = accounts.sign_in(&profile).await?;
            println!("Signed in {} ({} credits)", user.email, user.credits);
        }
        AccountCommands::ApplyPayment { event } => {
            let event: PaymentEvent = read_json(&event)?;
            match accounts.apply_payment_event(&event).await? {
                Some(user) => println!(
                    "Payment applied to {}: {} credits, pro: {}",
                    user.email, user.credits, user.is_pro
                ),
                None => println!(
                    "Payment status '{}' grants nothing; ignored",
                    event.payment_status
                ),
            }
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
