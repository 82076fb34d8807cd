//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// idea-validator: CLI tool for validating startup ideas with LLM-powered market analysis
#[derive(Parser, Debug)]
#[command(name = "idea-validator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a startup idea and print a validation report
    Analyze(AnalyzeArgs),

    /// Ask a follow-up question about a saved report
    Chat(ChatArgs),

    /// Manage user accounts and credits
    Account(AccountArgs),

    /// Sign up for launch updates
    Waitlist(WaitlistArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

/// Per-call provider override ("bring your own provider")
#[derive(Args, Debug, Default)]
pub struct ProviderArgs {
    /// Provider for this call (google, openai, anthropic, openrouter, stub)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model for this call (defaults to the provider's configured model)
    #[arg(long, requires = "provider")]
    pub model: Option<String>,

    /// Env var holding the API key for this call
    #[arg(long, requires = "provider")]
    pub api_key_env: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Idea description
    #[arg(long, conflicts_with = "file")]
    pub idea: Option<String>,

    /// File containing the idea description (use - for stdin)
    #[arg(long, conflicts_with = "idea")]
    pub file: Option<PathBuf>,

    /// Supporting file (image, PDF, or text document)
    #[arg(long)]
    pub attach: Option<PathBuf>,

    /// Media type of the attachment (inferred from the extension if omitted)
    #[arg(long, requires = "attach")]
    pub mime: Option<String>,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Charge a credit to this account and save the report
    #[arg(long)]
    pub user: Option<String>,

    /// Email the report summary to --user
    #[arg(long, requires = "user")]
    pub notify: bool,

    /// Serve a canned report if every provider fails
    #[arg(long)]
    pub offline_fallback: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Question about the report
    #[arg(long)]
    pub message: String,

    /// Report JSON file, as printed by `analyze --json`
    #[arg(long)]
    pub report: PathBuf,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args, Debug)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommands,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Show an account and its saved reports
    Show {
        #[arg(long)]
        email: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or refresh an account from an identity profile JSON file
    SignIn {
        #[arg(long)]
        profile: PathBuf,
    },

    /// Apply a payment event JSON file
    ApplyPayment {
        #[arg(long)]
        event: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct WaitlistArgs {
    #[command(subcommand)]
    pub command: WaitlistCommands,
}

#[derive(Subcommand, Debug)]
pub enum WaitlistCommands {
    /// Add an email to the waitlist and queue a confirmation
    Join {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print how many people are waiting
    Count,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
