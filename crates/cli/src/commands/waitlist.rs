//! Waitlist command - launch signups

use anyhow::Result;
use idea_validator_adapters::outbox::OutboxMailer;
use idea_validator_adapters::store::SqliteStore;
use idea_validator_domain::usecases::WaitlistUseCase;
use std::path::PathBuf;
use std::sync::Arc;

use super::open_store;
use crate::args::{WaitlistArgs, WaitlistCommands};
use crate::config::AppConfig;

pub async fn execute(args: WaitlistArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    match args.command {
        WaitlistCommands::Join { email, name, json } => {
            let waitlist = open_waitlist(&config).await?;
            let joined = waitlist.join(&email, name.as_deref()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&joined)?);
            } else if joined.newly_joined {
                println!("Added {} to the waitlist", joined.entry.email);
                if !joined.confirmation_sent {
                    println!("Confirmation email could not be queued");
                }
            } else {
                println!("{} is already on the waitlist", joined.entry.email);
            }
        }
        WaitlistCommands::Count => {
            let waitlist = WaitlistUseCase::new(open_store(&config).await?);
            println!("{}", waitlist.count().await?);
        }
    }

    Ok(())
}

/// Waitlist backed by the database, confirming through the outbox when it opens
async fn open_waitlist(config: &AppConfig) -> Result<WaitlistUseCase<SqliteStore>> {
    let waitlist = WaitlistUseCase::new(open_store(config).await?);

    match OutboxMailer::open(config.general.outbox_path.clone()).await {
        Ok(mailer) => Ok(waitlist.with_mailer(Arc::new(mailer))),
        Err(e) => {
            tracing::warn!(
                path = %config.general.outbox_path.display(),
                error = %e,
                "Failed to open mail outbox, confirmations disabled"
            );
            Ok(waitlist)
        }
    }
}
