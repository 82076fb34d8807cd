//! Account use case: sign-in, payment entitlements, credit charging

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::model::{IdentityProfile, PaymentEvent, UserRecord, ValidationReport};
use crate::ports::{Clock, ReportStore, StoreError, SystemClock, UserStore};

/// Credits granted by the `starter` plan
pub const STARTER_PLAN_CREDITS: u32 = 10;

/// Configuration for the accounts use case
#[derive(Debug, Clone)]
pub struct AccountsConfig {
    /// Credits a brand-new user starts with
    pub starting_credits: u32,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            starting_credits: 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountsError {
    #[error("No account found for {0}")]
    UnknownUser(String),
    #[error("{email} has no credits left")]
    NoCredits { email: String },
    #[error("Invalid payment event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a paid plan grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Pro,
    Credits(u32),
}

impl Entitlement {
    /// Parse a plan identifier: `pro`, `starter` or `credits_<n>`
    pub fn from_plan(plan: &str) -> Option<Self> {
        let plan = plan.trim().to_ascii_lowercase();
        match plan.as_str() {
            "pro" => Some(Entitlement::Pro),
            "starter" => Some(Entitlement::Credits(STARTER_PLAN_CREDITS)),
            other => other
                .strip_prefix("credits_")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .map(Entitlement::Credits),
        }
    }
}

/// Payment statuses that grant entitlements
fn is_settled(status: &str) -> bool {
    matches!(
        status.trim().to_ascii_lowercase().as_str(),
        "paid" | "succeeded"
    )
}

pub struct AccountsUseCase<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: AccountsConfig,
}

impl<S: UserStore + ReportStore> AccountsUseCase<S> {
    pub fn new(store: S, config: AccountsConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create or refresh the user behind a verified identity
    pub async fn sign_in(&self, profile: &IdentityProfile) -> Result<UserRecord, AccountsError> {
        let email = normalize_email(&profile.email);
        if email.is_empty() {
            return Err(AccountsError::InvalidEvent(
                "identity profile has no email".to_string(),
            ));
        }

        let now = self.clock.now();
        let user = match self.store.get_user(&email).await? {
            Some(mut existing) => {
                existing.name = profile.name.clone();
                existing.avatar_url = profile.picture_url.clone();
                existing.updated_at = now;
                tracing::info!(email = %email, "Returning user signed in");
                existing
            }
            None => {
                tracing::info!(
                    email = %email,
                    credits = self.config.starting_credits,
                    "New user signed in"
                );
                UserRecord {
                    email: email.clone(),
                    name: profile.name.clone(),
                    avatar_url: profile.picture_url.clone(),
                    credits: self.config.starting_credits,
                    is_pro: false,
                    preferences: Value::Object(Default::default()),
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        self.store.upsert_user(&user).await?;
        Ok(user)
    }

    /// Apply a payment webhook; returns `None` when the event grants nothing
    pub async fn apply_payment_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<Option<UserRecord>, AccountsError> {
        if !is_settled(&event.payment_status) {
            tracing::info!(
                email = %event.customer_email,
                status = %event.payment_status,
                "Ignoring unsettled payment"
            );
            return Ok(None);
        }

        let entitlement = Entitlement::from_plan(&event.plan_type).ok_or_else(|| {
            AccountsError::InvalidEvent(format!("unknown plan type '{}'", event.plan_type))
        })?;

        let email = normalize_email(&event.customer_email);
        let mut user = self
            .store
            .get_user(&email)
            .await?
            .ok_or_else(|| AccountsError::UnknownUser(email.clone()))?;

        match entitlement {
            Entitlement::Pro => user.is_pro = true,
            Entitlement::Credits(n) => user.credits = user.credits.saturating_add(n),
        }
        user.updated_at = self.clock.now();

        self.store.upsert_user(&user).await?;

        tracing::info!(
            email = %email,
            entitlement = ?entitlement,
            credits = user.credits,
            is_pro = user.is_pro,
            "Payment applied"
        );

        Ok(Some(user))
    }

    /// Store the report, then consume one credit (pro users are never charged)
    ///
    /// A failed save leaves the balance untouched.
    pub async fn charge_and_save(
        &self,
        email: &str,
        report: &ValidationReport,
    ) -> Result<UserRecord, AccountsError> {
        let email = normalize_email(email);
        let mut user = self
            .store
            .get_user(&email)
            .await?
            .ok_or_else(|| AccountsError::UnknownUser(email.clone()))?;

        if !user.is_pro && user.credits == 0 {
            return Err(AccountsError::NoCredits { email });
        }

        self.store.append_report(&email, report).await?;

        if !user.is_pro {
            user.credits -= 1;
            user.updated_at = self.clock.now();
            self.store.upsert_user(&user).await?;
        }

        tracing::debug!(
            email = %email,
            report_id = %report.id,
            credits = user.credits,
            "Report saved"
        );

        Ok(user)
    }

    /// Check that a user may run an analysis before spending a provider call
    pub async fn ensure_can_analyze(&self, email: &str) -> Result<UserRecord, AccountsError> {
        let email = normalize_email(email);
        let user = self
            .store
            .get_user(&email)
            .await?
            .ok_or_else(|| AccountsError::UnknownUser(email.clone()))?;

        if !user.is_pro && user.credits == 0 {
            return Err(AccountsError::NoCredits { email });
        }
        Ok(user)
    }

    pub async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, AccountsError> {
        Ok(self.store.get_user(&normalize_email(email)).await?)
    }

    pub async fn reports(&self, email: &str) -> Result<Vec<ValidationReport>, AccountsError> {
        Ok(self.store.list_reports(&normalize_email(email)).await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
